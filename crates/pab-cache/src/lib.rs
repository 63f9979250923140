//! # PAB Cache
//!
//! 目錄快取與快取填充模組

pub mod error;
pub mod fill;
pub mod memory;
pub mod pending;
pub mod sqlite;
pub mod store;

// Re-export 主要類型
pub use error::{CacheError, CacheResult};
pub use fill::{CacheFiller, FillConfig, FillReport};
pub use memory::MemoryCache;
pub use pending::PendingKeys;
pub use sqlite::SqliteCache;
pub use store::{CatalogCache, InsertOutcome};
