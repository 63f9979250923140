//! 外部目錄解析介面
//!
//! 市集與原廠目錄的查詢實作（HTTP、檔案、記憶體假物件）皆透過這些 trait 替換。

use crate::cart::LotListing;
use crate::catalog::SaleStatus;

/// 解析錯誤
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    #[error("請求失敗: {0}")]
    Transport(String),

    #[error("查無資料: {0}")]
    NotFound(String),

    #[error("回應格式錯誤: {0}")]
    Malformed(String),

    #[error("未知的銷售通道: {0}")]
    UnknownChannel(String),
}

/// 市集目錄查詢：設計編號 → (顏色, 元件編號) 清單
pub trait MappingResolver: Send + Sync {
    fn resolve_mapping(&self, design_id: &str) -> Result<Vec<(u32, String)>, ResolveError>;
}

/// 原廠銷售狀態查詢：元件編號 → 銷售狀態
pub trait StatusResolver: Send + Sync {
    fn resolve_status(&self, element_id: &str) -> Result<SaleStatus, ResolveError>;
}

/// 市集店家批次查詢：(店家, 批號) → 零件與價格
pub trait LotResolver: Send + Sync {
    fn resolve_lot(&self, store_id: &str, lot_id: &str) -> Result<LotListing, ResolveError>;
}
