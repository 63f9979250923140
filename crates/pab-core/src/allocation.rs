//! 分配與出貨模型

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::SaleChannel;

/// 目的群組
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DestinationGroup {
    /// 原廠主要通道
    Bestseller,
    /// 原廠次要通道
    Standard,
}

impl DestinationGroup {
    /// 所有群組（匯出時的固定順序）
    pub const ALL: [DestinationGroup; 2] = [DestinationGroup::Bestseller, DestinationGroup::Standard];

    /// 由銷售通道決定目的群組
    pub fn for_channel(channel: SaleChannel) -> Self {
        match channel {
            SaleChannel::Bestseller => DestinationGroup::Bestseller,
            SaleChannel::Standard => DestinationGroup::Standard,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DestinationGroup::Bestseller => "manufacturer-bestseller",
            DestinationGroup::Standard => "manufacturer-standard",
        }
    }
}

impl fmt::Display for DestinationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 分配：目的鍵（原廠元件編號）+ 數量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// 原廠元件編號
    pub element_id: String,
    /// 數量
    pub quantity: u32,
}

impl Allocation {
    pub fn new(element_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            element_id: element_id.into(),
            quantity,
        }
    }
}

/// 目的群組內的分配清單（依首次出現順序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationGroup {
    /// 目的群組
    pub group: DestinationGroup,
    /// 分配清單
    pub allocations: Vec<Allocation>,
}

impl AllocationGroup {
    /// 創建空群組
    pub fn new(group: DestinationGroup) -> Self {
        Self {
            group,
            allocations: Vec::new(),
        }
    }

    /// 批數（不同目的鍵的數量）
    pub fn lots(&self) -> usize {
        self.allocations.len()
    }

    /// 累計數量
    pub fn total_quantity(&self) -> u64 {
        self.allocations.iter().map(|a| u64::from(a.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// 依目的鍵查找
    pub fn find(&self, element_id: &str) -> Option<&Allocation> {
        self.allocations.iter().find(|a| a.element_id == element_id)
    }
}

/// 出貨（一張訂單）：群組分配清單的一段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    /// 目的群組
    pub group: DestinationGroup,
    /// 段序號（從 0 開始）
    pub index: usize,
    /// 分配清單
    pub allocations: Vec<Allocation>,
}

impl Shipment {
    pub fn lots(&self) -> usize {
        self.allocations.len()
    }

    pub fn total_quantity(&self) -> u64 {
        self.allocations.iter().map(|a| u64::from(a.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_totals() {
        let mut group = AllocationGroup::new(DestinationGroup::Bestseller);
        group.allocations.push(Allocation::new("300121", 10));
        group.allocations.push(Allocation::new("300126", 4));

        assert_eq!(group.lots(), 2);
        assert_eq!(group.total_quantity(), 14);
        assert_eq!(group.find("300126").map(|a| a.quantity), Some(4));
        assert!(group.find("999").is_none());
    }

    #[test]
    fn test_group_for_channel() {
        assert_eq!(
            DestinationGroup::for_channel(SaleChannel::Bestseller),
            DestinationGroup::Bestseller
        );
        assert_eq!(
            DestinationGroup::for_channel(SaleChannel::Standard),
            DestinationGroup::Standard
        );
        assert_eq!(DestinationGroup::Standard.to_string(), "manufacturer-standard");
    }

    #[test]
    fn test_allocation_json_field_names() {
        let json = serde_json::to_string(&Allocation::new("300121", 3)).unwrap();
        assert_eq!(json, r#"{"elementId":"300121","quantity":3}"#);
    }
}
