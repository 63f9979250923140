//! 輸出檔案命名

use std::path::{Path, PathBuf};

use crate::error::{IoError, IoResult};

/// 以輸入檔名為基礎的輸出路徑
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    dir: PathBuf,
    stem: String,
}

impl OutputNames {
    /// 未指定輸出目錄時，輸出至輸入檔所在目錄
    pub fn new(input: &Path, out_dir: Option<&Path>) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let dir = match out_dir {
            Some(dir) => dir.to_path_buf(),
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        Self { dir, stem }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.stem, suffix))
    }

    /// 原廠不販售（回寫市集）
    pub fn not_available(&self) -> PathBuf {
        self.file("_not_available.xml")
    }

    /// 本次無法判定
    pub fn unresolved(&self) -> PathBuf {
        self.file("_unresolved.xml")
    }

    /// 第 `index` 張訂單（1 起算）
    pub fn order_csv(&self, index: usize) -> PathBuf {
        self.file(&format!("_order{index}.csv"))
    }

    pub fn order_json(&self, index: usize) -> PathBuf {
        self.file(&format!("_order{index}.json"))
    }

    /// 購物車改向原廠的第 `index` 張訂單（1 起算）
    pub fn pab_order_csv(&self, index: usize) -> PathBuf {
        self.file(&format!("_pab_order{index}.csv"))
    }

    pub fn pab_order_json(&self, index: usize) -> PathBuf {
        self.file(&format!("_pab_order{index}.json"))
    }

    /// 執行統計
    pub fn summary(&self) -> PathBuf {
        self.file("_summary.json")
    }

    /// 留在市集的購物車
    pub fn retained_cart(&self) -> PathBuf {
        self.file("_retained.cart")
    }
}

/// 檢查副檔名
pub fn require_extension(path: &Path, expected: &str) -> IoResult<()> {
    let matches = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(expected));
    if matches {
        Ok(())
    } else {
        Err(IoError::WrongExtension {
            path: path.to_path_buf(),
            expected: expected.to_string(),
        })
    }
}
