//! # PAB
//!
//! 零件清單對帳工具：將市集零件清單轉為原廠訂單，並找出購物車中原廠較便宜的批次。

pub mod console;
pub mod logging;
pub mod pipeline;

pub use console::ConsoleDecisionSource;
pub use pipeline::{
    import_mappings, load_config, merge, purge, CatalogFill, ConvertReport, Pipeline,
    PurgeTables, Resolvers, SaveMoneyReport,
};
