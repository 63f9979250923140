//! # PAB IO
//!
//! 零件清單、購物車與訂單檔案讀寫

pub mod cart;
pub mod error;
pub mod export;
pub mod merge;
pub mod naming;
pub mod partslist;

// Re-export 主要類型
pub use cart::{decode_cart, encode_cart, read_cart};
pub use error::{IoError, IoResult};
pub use export::{write_cart, write_csv, write_inventory_xml, write_json, MAX_PRICE_SENTINEL};
pub use merge::merge_partslists;
pub use naming::{require_extension, OutputNames};
pub use partslist::{parse_partslist, read_partslist, Partslist, PartslistStats};
