//! 檔案讀寫錯誤

use std::path::PathBuf;

use thiserror::Error;

/// 檔案讀寫錯誤
#[derive(Error, Debug)]
pub enum IoError {
    #[error("檔案讀寫失敗: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML 解析失敗: {0}")]
    Xml(String),

    #[error("十六進位解碼失敗: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("編碼錯誤: {0}")]
    Encoding(String),

    #[error("CSV 讀寫失敗: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON 序列化失敗: {0}")]
    Json(#[from] serde_json::Error),

    #[error("格式錯誤: {0}")]
    InvalidFormat(String),

    #[error("合併後數量溢位: {0}")]
    QuantityOverflow(String),

    #[error("副檔名必須為 .{expected}: {}", path.display())]
    WrongExtension { path: PathBuf, expected: String },
}

pub type IoResult<T> = Result<T, IoError>;

pub(crate) fn xml_error(err: impl std::fmt::Display) -> IoError {
    IoError::Xml(err.to_string())
}
