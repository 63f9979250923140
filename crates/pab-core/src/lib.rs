//! # PAB Core
//!
//! 核心資料模型與類型定義

pub mod allocation;
pub mod availability;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod requirement;
pub mod resolver;

// Re-export 主要類型
pub use allocation::{Allocation, AllocationGroup, DestinationGroup, Shipment};
pub use availability::{OptionIndex, OptionLookup};
pub use cart::{CartLot, LotListing, PricedLot};
pub use catalog::{CatalogMapping, Cents, SaleChannel, SaleOption, SaleStatus, StoreOffer};
pub use config::{Condition, ReconcileConfig, TieBreakPolicy, DEFAULT_MAX_LOTS};
pub use requirement::{ItemType, PartKey, Requirement};
pub use resolver::{LotResolver, MappingResolver, ResolveError, StatusResolver};

/// PAB 錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum PabError {
    #[error("資料完整性錯誤: {key} 有 {count} 個可販售方案（上限 2）")]
    TooManyOptions { key: String, count: usize },

    #[error("未知的銷售通道: {0}")]
    UnknownSaleChannel(String),

    #[error("未設定決勝規則，無法在同價方案間選擇: {0}")]
    NoTieBreakPolicy(String),

    #[error("決勝規則無法區分方案: {0}")]
    TieBreakUndecided(String),

    #[error("決策來源無法提供選擇: {0}")]
    DecisionUnavailable(String),

    #[error("數量溢位: {element_id} 已有 {existing}，無法再加 {added}")]
    QuantityOverflow { element_id: String, existing: u32, added: u32 },

    #[error("無效的配置: {0}")]
    InvalidConfig(String),

    #[error("其他錯誤: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PabError>;
