//! 可販售方案索引
//!
//! 由快取內容建立後交給計算引擎，引擎本身不接觸快取。

use std::collections::HashMap;

use crate::catalog::SaleOption;
use crate::requirement::PartKey;

/// 單一零件的查詢結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionLookup {
    /// 目錄資料完整；清單僅含可販售方案（依元件編號排序）
    Resolved(Vec<SaleOption>),
    /// 目錄資料不完整（對照或銷售狀態尚未快取），本次無法判定
    Unresolved(String),
}

/// 零件 → 可販售方案
#[derive(Debug, Clone, Default)]
pub struct OptionIndex {
    entries: HashMap<PartKey, OptionLookup>,
}

impl OptionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 記錄已解析的方案
    pub fn insert_resolved(&mut self, key: PartKey, mut options: Vec<SaleOption>) {
        options.sort_by(|a, b| a.element_id.cmp(&b.element_id));
        self.entries.insert(key, OptionLookup::Resolved(options));
    }

    /// 記錄無法解析的零件
    pub fn mark_unresolved(&mut self, key: PartKey, reason: impl Into<String>) {
        self.entries.insert(key, OptionLookup::Unresolved(reason.into()));
    }

    /// 查詢；未登錄的零件視為無法解析
    pub fn lookup(&self, key: &PartKey) -> OptionLookup {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| OptionLookup::Unresolved(format!("{key} 未在索引中")))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SaleChannel;

    #[test]
    fn test_resolved_options_are_sorted() {
        let mut index = OptionIndex::new();
        index.insert_resolved(
            PartKey::new("3001", 5),
            vec![
                SaleOption::new("4211111", 20, SaleChannel::Standard, 200),
                SaleOption::new("300121", 20, SaleChannel::Bestseller, 200),
            ],
        );

        match index.lookup(&PartKey::new("3001", 5)) {
            OptionLookup::Resolved(options) => {
                assert_eq!(options[0].element_id, "300121");
                assert_eq!(options[1].element_id, "4211111");
            }
            other => panic!("預期 Resolved，實際 {other:?}"),
        }
    }

    #[test]
    fn test_missing_key_is_unresolved() {
        let index = OptionIndex::new();
        assert!(matches!(
            index.lookup(&PartKey::new("3001", 5)),
            OptionLookup::Unresolved(_)
        ));
    }
}
