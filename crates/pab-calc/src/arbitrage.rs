//! 購物車套利：市集批次與原廠單價比較

use pab_core::{OptionIndex, OptionLookup, PabError, PricedLot, SaleOption};
use rust_decimal::Decimal;

use crate::accumulator::Accumulator;
use crate::ReconcileWarning;

/// 單一批次的判定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LotDecision {
    /// 留在市集購物車
    Retain,
    /// 改向原廠購買（原廠較便宜的方案）
    Migrate(SaleOption),
}

/// 套利結果
#[derive(Debug, Clone)]
pub struct ArbitrageResult {
    /// 留在購物車的批次（保留原始店家/批號）
    pub retained: Vec<PricedLot>,

    /// 改向原廠購買的分配（依元件編號合併）
    pub migrated: Accumulator,

    /// 改向原廠購買的預估節省金額（分）
    pub estimated_savings: Decimal,

    /// 警告（無法解析、資料完整性錯誤）
    pub warnings: Vec<ReconcileWarning>,
}

/// 購物車套利器
pub struct CartArbitrator;

impl CartArbitrator {
    /// 判定單一批次
    ///
    /// 兩個原廠方案時取較便宜者再比較；超過兩個為資料完整性錯誤。
    /// 市集單價小於或等於原廠單價時保留。
    pub fn decide(lot: &PricedLot, options: &[SaleOption]) -> pab_core::Result<LotDecision> {
        if options.len() > 2 {
            return Err(PabError::TooManyOptions {
                key: lot.part.to_string(),
                count: options.len(),
            });
        }

        let cheapest = options.iter().min_by_key(|o| o.price);
        match cheapest {
            None => Ok(LotDecision::Retain),
            Some(option) if lot.unit_price <= Decimal::from(option.price) => Ok(LotDecision::Retain),
            Some(option) => Ok(LotDecision::Migrate(option.clone())),
        }
    }

    /// 對整個購物車套利
    ///
    /// 無法判定的批次（索引未解析或資料完整性錯誤）保留在購物車並記錄警告。
    pub fn arbitrate(lots: &[PricedLot], index: &OptionIndex) -> ArbitrageResult {
        tracing::info!("開始購物車套利：{} 批", lots.len());

        let mut result = ArbitrageResult {
            retained: Vec::new(),
            migrated: Accumulator::new(),
            estimated_savings: Decimal::ZERO,
            warnings: Vec::new(),
        };

        for lot in lots {
            let options = match index.lookup(&lot.part) {
                OptionLookup::Resolved(options) => options,
                OptionLookup::Unresolved(reason) => {
                    tracing::warn!("批次 {}/{} 無法解析: {}", lot.lot.store_id, lot.lot.lot_id, reason);
                    result
                        .warnings
                        .push(ReconcileWarning::warning(lot.part.to_string(), reason));
                    result.retained.push(lot.clone());
                    continue;
                }
            };

            match Self::decide(lot, &options) {
                Ok(LotDecision::Retain) => result.retained.push(lot.clone()),
                Ok(LotDecision::Migrate(option)) => {
                    if let Err(e) = result.migrated.accumulate(&option, lot.lot.quantity) {
                        tracing::error!("批次 {}/{} 無法改向原廠: {}", lot.lot.store_id, lot.lot.lot_id, e);
                        result
                            .warnings
                            .push(ReconcileWarning::error(lot.part.to_string(), e.to_string()));
                        result.retained.push(lot.clone());
                        continue;
                    }
                    let saving =
                        (lot.unit_price - Decimal::from(option.price)) * Decimal::from(lot.lot.quantity);
                    tracing::debug!(
                        "批次 {}/{} 改向原廠 {}：{} → {} 分，數量 {}",
                        lot.lot.store_id,
                        lot.lot.lot_id,
                        option.element_id,
                        lot.unit_price,
                        option.price,
                        lot.lot.quantity
                    );
                    result.estimated_savings += saving;
                }
                Err(e) => {
                    tracing::error!("批次 {}/{}: {}", lot.lot.store_id, lot.lot.lot_id, e);
                    result
                        .warnings
                        .push(ReconcileWarning::error(lot.part.to_string(), e.to_string()));
                    result.retained.push(lot.clone());
                }
            }
        }

        tracing::info!(
            "套利完成：保留 {} 批，改向原廠 {} 批，預估節省 {} 分",
            result.retained.len(),
            result.migrated.total_lots(),
            result.estimated_savings
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pab_core::{CartLot, DestinationGroup, PartKey, SaleChannel};

    fn lot(lot_id: &str, price: i64, quantity: u32) -> PricedLot {
        PricedLot::new(
            CartLot::new("store-1", lot_id, quantity),
            PartKey::new("3001", 5),
            Decimal::from(price),
        )
    }

    fn index_with(options: Vec<SaleOption>) -> OptionIndex {
        let mut index = OptionIndex::new();
        index.insert_resolved(PartKey::new("3001", 5), options);
        index
    }

    #[test]
    fn test_expensive_lot_migrates() {
        let index = index_with(vec![SaleOption::new("300121", 450, SaleChannel::Bestseller, 200)]);
        let result = CartArbitrator::arbitrate(&[lot("L1", 500, 6)], &index);

        assert!(result.retained.is_empty());
        let group = result.migrated.group(DestinationGroup::Bestseller);
        assert_eq!(group.lots(), 1);
        assert_eq!(group.allocations[0].element_id, "300121");
        assert_eq!(group.allocations[0].quantity, 6);
        assert_eq!(result.estimated_savings, Decimal::from(300));
    }

    #[test]
    fn test_cheaper_lot_retained_unchanged() {
        let index = index_with(vec![SaleOption::new("300121", 450, SaleChannel::Bestseller, 200)]);
        let input = lot("L2", 400, 6);
        let result = CartArbitrator::arbitrate(&[input.clone()], &index);

        assert_eq!(result.retained, vec![input]);
        assert_eq!(result.migrated.total_lots(), 0);
    }

    #[test]
    fn test_equal_price_is_retained() {
        let decision = CartArbitrator::decide(
            &lot("L", 450, 1),
            &[SaleOption::new("300121", 450, SaleChannel::Bestseller, 200)],
        )
        .unwrap();

        assert_eq!(decision, LotDecision::Retain);
    }

    #[test]
    fn test_two_options_uses_cheaper() {
        let decision = CartArbitrator::decide(
            &lot("L", 300, 1),
            &[
                SaleOption::new("300121", 350, SaleChannel::Bestseller, 200),
                SaleOption::new("4211111", 250, SaleChannel::Standard, 50),
            ],
        )
        .unwrap();

        assert_eq!(
            decision,
            LotDecision::Migrate(SaleOption::new("4211111", 250, SaleChannel::Standard, 50))
        );
    }

    #[test]
    fn test_three_options_is_error_and_lot_kept() {
        let options = vec![
            SaleOption::new("1", 1, SaleChannel::Bestseller, 200),
            SaleOption::new("2", 1, SaleChannel::Bestseller, 200),
            SaleOption::new("3", 1, SaleChannel::Standard, 200),
        ];
        assert!(matches!(
            CartArbitrator::decide(&lot("L", 500, 1), &options),
            Err(PabError::TooManyOptions { count: 3, .. })
        ));

        let result = CartArbitrator::arbitrate(&[lot("L", 500, 1)], &index_with(options));
        assert_eq!(result.retained.len(), 1);
        assert_eq!(result.migrated.total_lots(), 0);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_same_element_from_two_lots_merges() {
        let index = index_with(vec![SaleOption::new("300121", 100, SaleChannel::Standard, 200)]);
        let result = CartArbitrator::arbitrate(&[lot("A", 200, 2), lot("B", 150, 3)], &index);

        let group = result.migrated.group(DestinationGroup::Standard);
        assert_eq!(group.lots(), 1);
        assert_eq!(group.allocations[0].quantity, 5);
    }

    #[test]
    fn test_unresolved_lot_retained() {
        let result = CartArbitrator::arbitrate(&[lot("L", 500, 1)], &OptionIndex::new());

        assert_eq!(result.retained.len(), 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_overflowing_migration_keeps_lot() {
        let index = index_with(vec![SaleOption::new("300121", 100, SaleChannel::Standard, 200)]);
        let result =
            CartArbitrator::arbitrate(&[lot("A", 200, u32::MAX), lot("B", 200, 1)], &index);

        assert_eq!(result.retained.len(), 1);
        assert_eq!(result.retained[0].lot.lot_id, "B");
        assert_eq!(result.migrated.total_quantity(), u64::from(u32::MAX));
        assert_eq!(result.warnings.len(), 1);
        // 只計入成功改向的批次
        assert_eq!(result.estimated_savings, Decimal::from(100) * Decimal::from(u32::MAX));
    }
}
