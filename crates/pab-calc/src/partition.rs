//! 訂單分段
//!
//! 群組分配清單超過單張訂單批數上限時，切成 `ceil(len / max_lots)` 段，
//! 段界為 `round(avg * i)`（avg = len / 段數，四捨六入五成雙），各段大小最多相差 1。

use pab_core::{Allocation, AllocationGroup, DestinationGroup, Shipment};

/// 合併訂單：同一段序號下，各群組的出貨段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedOrder {
    /// 段序號（從 0 開始）
    pub index: usize,
    /// 各群組出貨段（群組較短時不含該群組）
    pub shipments: Vec<Shipment>,
}

impl CombinedOrder {
    /// 依群組順序串接的分配清單
    pub fn allocations(&self) -> Vec<Allocation> {
        self.shipments
            .iter()
            .flat_map(|s| s.allocations.iter().cloned())
            .collect()
    }

    pub fn lots(&self) -> usize {
        self.shipments.iter().map(|s| s.lots()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shipments.iter().all(|s| s.is_empty())
    }

    /// 指定群組的出貨段
    pub fn shipment(&self, group: DestinationGroup) -> Option<&Shipment> {
        self.shipments.iter().find(|s| s.group == group)
    }
}

/// 訂單分段器
pub struct OrderPartitioner;

impl OrderPartitioner {
    /// 段數
    pub fn chunk_count(len: usize, max_lots: usize) -> usize {
        let max_lots = max_lots.max(1);
        if len <= max_lots {
            1
        } else {
            len.div_ceil(max_lots)
        }
    }

    /// 分段
    ///
    /// 未超過上限時返回單一出貨段（含空清單）；串接所有段即還原輸入。
    pub fn partition(
        group: DestinationGroup,
        allocations: &[Allocation],
        max_lots: usize,
    ) -> Vec<Shipment> {
        let chunks = Self::chunk_count(allocations.len(), max_lots);

        let shipments: Vec<Shipment> = (0..chunks)
            .map(|i| {
                let start = Self::boundary(allocations.len(), chunks, i);
                let end = Self::boundary(allocations.len(), chunks, i + 1);
                Shipment {
                    group,
                    index: i,
                    allocations: allocations[start..end].to_vec(),
                }
            })
            .collect();

        tracing::debug!(
            "{}: {} 批分為 {} 段 (上限 {})",
            group,
            allocations.len(),
            shipments.len(),
            max_lots
        );

        shipments
    }

    /// 分段整個群組
    pub fn partition_group(group: &AllocationGroup, max_lots: usize) -> Vec<Shipment> {
        Self::partition(group.group, &group.allocations, max_lots)
    }

    /// 依段序號配對各群組的出貨段
    ///
    /// 配對只看序號不看內容；段數較少的群組在後面的序號中缺席。
    pub fn pair(groups: &[Vec<Shipment>]) -> Vec<CombinedOrder> {
        let count = groups.iter().map(|g| g.len()).max().unwrap_or(0);

        (0..count)
            .map(|index| CombinedOrder {
                index,
                shipments: groups
                    .iter()
                    .filter_map(|g| g.get(index).cloned())
                    .collect(),
            })
            .collect()
    }

    /// 第 i 個段界：round(len * i / chunks)，以整數運算並採銀行家捨入
    fn boundary(len: usize, chunks: usize, i: usize) -> usize {
        let numerator = len * i;
        let quotient = numerator / chunks;
        let remainder = numerator % chunks;

        match (remainder * 2).cmp(&chunks) {
            std::cmp::Ordering::Less => quotient,
            std::cmp::Ordering::Greater => quotient + 1,
            std::cmp::Ordering::Equal => quotient + quotient % 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn allocations(n: usize) -> Vec<Allocation> {
        (0..n)
            .map(|i| Allocation::new(format!("E{i}"), (i % 7 + 1) as u32))
            .collect()
    }

    fn concat(shipments: &[Shipment]) -> Vec<Allocation> {
        shipments
            .iter()
            .flat_map(|s| s.allocations.iter().cloned())
            .collect()
    }

    #[test]
    fn test_exactly_max_is_single_shipment() {
        let input = allocations(200);
        let result = OrderPartitioner::partition(DestinationGroup::Bestseller, &input, 200);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].allocations, input);
    }

    #[test]
    fn test_one_over_max_splits_in_two() {
        let input = allocations(201);
        let result = OrderPartitioner::partition(DestinationGroup::Bestseller, &input, 200);

        assert_eq!(result.len(), 2);
        assert!(result[0].lots().abs_diff(result[1].lots()) <= 1);
        assert_eq!(result[0].lots() + result[1].lots(), 201);
        assert_eq!(concat(&result), input);
        assert_eq!(result[1].index, 1);
    }

    #[test]
    fn test_empty_group_is_single_empty_shipment() {
        let result = OrderPartitioner::partition(DestinationGroup::Standard, &[], 200);

        assert_eq!(result.len(), 1);
        assert!(result[0].is_empty());
    }

    #[rstest]
    #[case(0, 200, 1)]
    #[case(1, 200, 1)]
    #[case(200, 200, 1)]
    #[case(201, 200, 2)]
    #[case(400, 200, 2)]
    #[case(401, 200, 3)]
    #[case(10, 3, 4)]
    fn test_chunk_count(#[case] len: usize, #[case] max: usize, #[case] expected: usize) {
        assert_eq!(OrderPartitioner::chunk_count(len, max), expected);
    }

    #[test]
    fn test_proportional_split_sizes() {
        // 10 批、上限 3 → 4 段，段界 0, 2(2.5→2), 5, 8(7.5→8), 10
        let input = allocations(10);
        let sizes: Vec<_> = OrderPartitioner::partition(DestinationGroup::Bestseller, &input, 3)
            .iter()
            .map(|s| s.lots())
            .collect();

        assert_eq!(sizes, vec![2, 3, 3, 2]);
    }

    #[test]
    fn test_pair_by_index() {
        let best = OrderPartitioner::partition(DestinationGroup::Bestseller, &allocations(5), 2);
        let std = OrderPartitioner::partition(DestinationGroup::Standard, &allocations(1), 2);
        assert_eq!(best.len(), 3);
        assert_eq!(std.len(), 1);

        let orders = OrderPartitioner::pair(&[best.clone(), std.clone()]);

        assert_eq!(orders.len(), 3);
        assert_eq!(orders[0].shipments.len(), 2);
        assert_eq!(orders[0].shipment(DestinationGroup::Standard), Some(&std[0]));
        // 較短群組在後段缺席
        assert!(orders[1].shipment(DestinationGroup::Standard).is_none());
        assert!(orders[2].shipment(DestinationGroup::Standard).is_none());
        assert_eq!(orders[2].shipment(DestinationGroup::Bestseller), Some(&best[2]));

        let first = orders[0].allocations();
        assert_eq!(first.len(), best[0].lots() + 1);
        assert_eq!(first.last(), std[0].allocations.last());
    }

    proptest! {
        /// 串接所有段必須完整還原輸入，且不超過上限
        #[test]
        fn partition_is_lossless(len in 0usize..900, max in 1usize..250) {
            let input = allocations(len);
            let result = OrderPartitioner::partition(DestinationGroup::Bestseller, &input, max);

            prop_assert_eq!(result.len(), OrderPartitioner::chunk_count(len, max));
            prop_assert!(result.iter().all(|s| s.lots() <= max));
            prop_assert_eq!(concat(&result), input);

            let min = result.iter().map(|s| s.lots()).min().unwrap_or(0);
            let max_size = result.iter().map(|s| s.lots()).max().unwrap_or(0);
            prop_assert!(max_size - min <= 1);
        }
    }
}
