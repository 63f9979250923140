//! 需求分類

use pab_core::{Requirement, SaleOption};

/// 需求分類結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// 沒有可販售方案
    Unavailable,
    /// 恰好一個方案
    Single(SaleOption),
    /// 兩個方案，需決勝
    Ambiguous(SaleOption, SaleOption),
    /// 超過兩個方案（資料完整性錯誤），不分配
    Invalid(Vec<SaleOption>),
}

impl Classification {
    /// 可販售方案數量
    pub fn option_count(&self) -> usize {
        match self {
            Classification::Unavailable => 0,
            Classification::Single(_) => 1,
            Classification::Ambiguous(_, _) => 2,
            Classification::Invalid(options) => options.len(),
        }
    }
}

/// 需求分類引擎
pub struct ResolutionEngine;

impl ResolutionEngine {
    /// 依可販售方案數量分類
    ///
    /// `options` 僅應包含 sells 為真的方案；分類本身無副作用（只記錄日誌）。
    pub fn classify(requirement: &Requirement, options: Vec<SaleOption>) -> Classification {
        let mut options = options.into_iter();
        match (options.next(), options.next(), options.next()) {
            (None, _, _) => Classification::Unavailable,
            (Some(only), None, _) => Classification::Single(only),
            (Some(a), Some(b), None) => Classification::Ambiguous(a, b),
            (Some(a), Some(b), Some(c)) => {
                let mut all = vec![a, b, c];
                all.extend(options);
                tracing::error!(
                    "需求 {} 有 {} 個可販售方案，排除於分配之外",
                    requirement.key(),
                    all.len()
                );
                Classification::Invalid(all)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pab_core::SaleChannel;

    fn option(element_id: &str, price: i64) -> SaleOption {
        SaleOption::new(element_id, price, SaleChannel::Bestseller, 200)
    }

    #[test]
    fn test_no_options_is_unavailable() {
        let req = Requirement::new("3001", 5, 10);
        let result = ResolutionEngine::classify(&req, vec![]);

        assert_eq!(result, Classification::Unavailable);
        assert_eq!(result.option_count(), 0);
    }

    #[test]
    fn test_single_option() {
        let req = Requirement::new("3001", 5, 10);
        let result = ResolutionEngine::classify(&req, vec![option("300121", 19)]);

        assert_eq!(result, Classification::Single(option("300121", 19)));
    }

    #[test]
    fn test_two_options_are_ambiguous() {
        let req = Requirement::new("3001", 5, 10);
        let result =
            ResolutionEngine::classify(&req, vec![option("300121", 19), option("4211111", 25)]);

        assert_eq!(
            result,
            Classification::Ambiguous(option("300121", 19), option("4211111", 25))
        );
    }

    #[test]
    fn test_three_options_are_invalid() {
        let req = Requirement::new("3001", 5, 10);
        let result = ResolutionEngine::classify(
            &req,
            vec![option("1", 10), option("2", 10), option("3", 10)],
        );

        assert!(matches!(result, Classification::Invalid(ref all) if all.len() == 3));
        assert_eq!(result.option_count(), 3);
    }
}
