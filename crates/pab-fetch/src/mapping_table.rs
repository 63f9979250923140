//! CSV 對照表：設計編號 → (顏色, 元件編號)
//!
//! 檔案欄位 `design_id,color_id,element_id`，含標題列。

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use pab_core::{CatalogMapping, MappingResolver, ResolveError};
use serde::Deserialize;

use crate::error::FetchError;

#[derive(Debug, Deserialize)]
struct Row {
    design_id: String,
    color_id: u32,
    element_id: String,
}

/// 以 CSV 檔提供的對照查詢
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    rows: Vec<CatalogMapping>,
    by_design: HashMap<String, Vec<(u32, String)>>,
}

impl MappingTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FetchError> {
        let path = path.as_ref();
        let table = Self::from_reader(std::fs::File::open(path).map_err(csv::Error::from)?)?;
        tracing::info!("載入對照表 {}: {} 列", path.display(), table.len());
        Ok(table)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, FetchError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut table = Self::default();
        for result in csv_reader.deserialize::<Row>() {
            let row = result.map_err(|e| FetchError::InvalidRow {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                message: e.to_string(),
            })?;
            if row.design_id.is_empty() || row.element_id.is_empty() {
                tracing::warn!("對照表列缺少欄位，已略過: {:?}", row);
                continue;
            }
            table.push(CatalogMapping::new(row.design_id, row.color_id, row.element_id));
        }
        Ok(table)
    }

    fn push(&mut self, mapping: CatalogMapping) {
        self.by_design
            .entry(mapping.design_id.clone())
            .or_default()
            .push((mapping.color_id, mapping.element_id.clone()));
        self.rows.push(mapping);
    }

    /// 所有對照列（檔案順序）
    pub fn rows(&self) -> &[CatalogMapping] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl MappingResolver for MappingTable {
    fn resolve_mapping(&self, design_id: &str) -> Result<Vec<(u32, String)>, ResolveError> {
        self.by_design
            .get(design_id)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(format!("對照表中沒有設計 {design_id}")))
    }
}
