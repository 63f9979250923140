//! 需求模型（零件清單中的一行）

use serde::{Deserialize, Serialize};
use std::fmt;

/// 零件識別鍵（設計編號 + 顏色）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartKey {
    /// 設計編號
    pub design_id: String,
    /// 顏色編號
    pub color_id: u32,
}

impl PartKey {
    /// 創建新的零件識別鍵
    pub fn new(design_id: impl Into<String>, color_id: u32) -> Self {
        Self {
            design_id: design_id.into(),
            color_id,
        }
    }
}

impl fmt::Display for PartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.design_id, self.color_id)
    }
}

/// 物品類型
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ItemType {
    /// 零件
    #[default]
    Part,
    /// 其他（人偶、套裝等），保留原始代碼以便回寫
    Other(String),
}

impl ItemType {
    /// 從清單代碼解析（`P` 為零件）
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "P" | "" => ItemType::Part,
            other => ItemType::Other(other.to_string()),
        }
    }

    /// 轉回清單代碼
    pub fn code(&self) -> &str {
        match self {
            ItemType::Part => "P",
            ItemType::Other(code) => code,
        }
    }

    pub fn is_part(&self) -> bool {
        matches!(self, ItemType::Part)
    }
}

/// 需求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// 設計編號
    pub design_id: String,

    /// 顏色編號
    pub color_id: u32,

    /// 需求數量（正整數）
    pub quantity: u32,

    /// 物品類型
    pub item_type: ItemType,
}

impl Requirement {
    /// 創建新的零件需求
    pub fn new(design_id: impl Into<String>, color_id: u32, quantity: u32) -> Self {
        Self {
            design_id: design_id.into(),
            color_id,
            quantity,
            item_type: ItemType::default(),
        }
    }

    /// 建構器模式：設置物品類型
    pub fn with_item_type(mut self, item_type: ItemType) -> Self {
        self.item_type = item_type;
        self
    }

    /// 識別鍵
    pub fn key(&self) -> PartKey {
        PartKey::new(self.design_id.clone(), self.color_id)
    }

    /// 檢查是否為零件
    pub fn is_part(&self) -> bool {
        self.item_type.is_part()
    }
}

/// 需求數量合計
pub fn total_quantity(requirements: &[Requirement]) -> u64 {
    requirements.iter().map(|r| u64::from(r.quantity)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_create_requirement() {
        let req = Requirement::new("3001", 5, 12);

        assert_eq!(req.design_id, "3001");
        assert_eq!(req.color_id, 5);
        assert_eq!(req.quantity, 12);
        assert!(req.is_part());
        assert_eq!(req.key(), PartKey::new("3001", 5));
    }

    #[test]
    fn test_default_item_type_is_part() {
        assert_eq!(ItemType::default(), ItemType::Part);
        assert_eq!(ItemType::default().code(), "P");
    }

    #[rstest]
    #[case("P", ItemType::Part)]
    #[case("", ItemType::Part)]
    #[case("M", ItemType::Other("M".to_string()))]
    #[case("S", ItemType::Other("S".to_string()))]
    fn test_item_type_codes(#[case] code: &str, #[case] expected: ItemType) {
        let parsed = ItemType::from_code(code);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_other_type_round_trips_code() {
        let req = Requirement::new("sw0001", 0, 1).with_item_type(ItemType::from_code("M"));
        assert!(!req.is_part());
        assert_eq!(req.item_type.code(), "M");
    }

    #[test]
    fn test_total_quantity() {
        let reqs = vec![Requirement::new("3001", 5, 12), Requirement::new("3002", 1, 3)];
        assert_eq!(total_quantity(&reqs), 15);
    }
}
