//! 對帳配置模型

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::PabError;

/// 單張訂單預設最大批數
pub const DEFAULT_MAX_LOTS: usize = 200;

/// 對帳配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// 單張訂單最大批數
    pub max_lots_per_shipment: usize,

    /// 價格相同時的決勝規則；`None` 表示遇到同價即失敗
    pub tie_break: Option<TieBreakPolicy>,

    /// 回寫市集清單時的成色旗標
    pub condition: Condition,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_lots_per_shipment: DEFAULT_MAX_LOTS,
            tie_break: None,
            condition: Condition::Any,
        }
    }
}

impl ReconcileConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置最大批數
    pub fn with_max_lots(mut self, max_lots: usize) -> Self {
        self.max_lots_per_shipment = max_lots;
        self
    }

    /// 建構器模式：設置決勝規則
    pub fn with_tie_break(mut self, policy: TieBreakPolicy) -> Self {
        self.tie_break = Some(policy);
        self
    }

    /// 建構器模式：設置成色旗標
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// 檢查配置是否有效
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_lots_per_shipment == 0 {
            return Err(PabError::InvalidConfig(
                "max_lots_per_shipment 必須大於 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// 同價決勝規則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreakPolicy {
    /// 選主要通道
    PreferPrimaryChannel,
    /// 選次要通道
    PreferSecondaryChannel,
    /// 選目前批數較多的目的群組
    PreferLargerDestinationGroup,
    /// 選目前累計數量較多的目的群組
    PreferLargerDestinationQuantity,
    /// 交由外部決策來源（人工）選擇
    Interactive,
}

impl FromStr for TieBreakPolicy {
    type Err = PabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" | "prefer-primary-channel" => Ok(TieBreakPolicy::PreferPrimaryChannel),
            "secondary" | "prefer-secondary-channel" => Ok(TieBreakPolicy::PreferSecondaryChannel),
            "larger-group" | "prefer-larger-destination-group" => {
                Ok(TieBreakPolicy::PreferLargerDestinationGroup)
            }
            "larger-quantity" | "prefer-larger-destination-quantity" => {
                Ok(TieBreakPolicy::PreferLargerDestinationQuantity)
            }
            "interactive" => Ok(TieBreakPolicy::Interactive),
            other => Err(PabError::InvalidConfig(format!("未知的決勝規則: {other}"))),
        }
    }
}

/// 零件成色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// 全新
    New,
    /// 二手
    Used,
    /// 不拘
    #[default]
    Any,
}

impl Condition {
    /// 清單代碼
    pub fn code(self) -> char {
        match self {
            Condition::New => 'N',
            Condition::Used => 'U',
            Condition::Any => 'X',
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Condition {
    type Err = PabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" | "N" => Ok(Condition::New),
            "used" | "U" => Ok(Condition::Used),
            "any" | "X" => Ok(Condition::Any),
            other => Err(PabError::InvalidConfig(format!("未知的成色: {other}"))),
        }
    }
}
