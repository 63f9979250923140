//! # PAB Reconciliation Engine
//!
//! 零件清單對帳與訂單分段引擎

pub mod accumulator;
pub mod arbitrage;
pub mod partition;
pub mod reconciler;
pub mod resolution;
pub mod tie_break;

// Re-export 主要類型
pub use accumulator::Accumulator;
pub use arbitrage::{ArbitrageResult, CartArbitrator, LotDecision};
pub use partition::{CombinedOrder, OrderPartitioner};
pub use reconciler::{ReconcileResult, Reconciler};
pub use resolution::{Classification, ResolutionEngine};
pub use tie_break::{DecisionSource, GroupSnapshot, GroupSnapshots, TieBreaker};

use pab_core::{DestinationGroup, Requirement};
use serde::Serialize;

/// 對帳警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileWarning {
    /// 相關項目（設計/顏色或店家/批號）
    pub subject: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl ReconcileWarning {
    pub fn new(subject: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            subject,
            message,
            severity,
        }
    }

    pub fn info(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Info)
    }

    pub fn warning(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Warning)
    }

    pub fn error(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}

/// 單一目的群組統計
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub group: DestinationGroup,
    pub lots: usize,
    pub quantity: u64,
}

/// 執行統計
///
/// 不販售 + 已分配 + 無法判定 + 排除 必須等於輸入總數量。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub input_quantity: u64,
    pub allocated_quantity: u64,
    pub unavailable_quantity: u64,
    pub unresolved_quantity: u64,
    pub excluded_quantity: u64,
    pub groups: Vec<GroupSummary>,
}

impl RunSummary {
    pub fn new(
        input: &[Requirement],
        unavailable: &[Requirement],
        unresolved: &[Requirement],
        excluded: &[Requirement],
        groups: &Accumulator,
    ) -> Self {
        Self {
            input_quantity: pab_core::requirement::total_quantity(input),
            allocated_quantity: groups.total_quantity(),
            unavailable_quantity: pab_core::requirement::total_quantity(unavailable),
            unresolved_quantity: pab_core::requirement::total_quantity(unresolved),
            excluded_quantity: pab_core::requirement::total_quantity(excluded),
            groups: groups
                .groups()
                .iter()
                .map(|g| GroupSummary {
                    group: g.group,
                    lots: g.lots(),
                    quantity: g.total_quantity(),
                })
                .collect(),
        }
    }

    /// 數量守恆檢查
    pub fn is_balanced(&self) -> bool {
        self.unavailable_quantity
            + self.allocated_quantity
            + self.unresolved_quantity
            + self.excluded_quantity
            == self.input_quantity
    }
}
