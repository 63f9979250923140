//! # PAB Fetch
//!
//! 外部目錄查詢端：原廠銷售狀態、市集店家批次、CSV 對照表

pub mod error;
pub mod mapping_table;
pub mod pick_a_brick;
pub mod store_lot;

// Re-export 主要類型
pub use error::FetchError;
pub use mapping_table::MappingTable;
pub use pick_a_brick::PickABrickClient;
pub use store_lot::StoreLotClient;

/// 請求逾時（秒）
pub const REQUEST_TIMEOUT_SECS: u64 = 20;

pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";
