//! 分配累加器

use pab_core::{Allocation, AllocationGroup, DestinationGroup, PabError, Result, SaleOption};

use crate::tie_break::{GroupSnapshot, GroupSnapshots};

/// 各目的群組的分配累加器
///
/// 同群組內相同元件編號的分配合併（數量相加），不重複；保留首次出現順序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulator {
    bestseller: AllocationGroup,
    standard: AllocationGroup,
}

impl Accumulator {
    /// 創建空累加器（每個目的群組一份）
    pub fn new() -> Self {
        Self {
            bestseller: AllocationGroup::new(DestinationGroup::Bestseller),
            standard: AllocationGroup::new(DestinationGroup::Standard),
        }
    }

    /// 將方案累加至其通道對應的目的群組，返回目的群組
    pub fn accumulate(&mut self, option: &SaleOption, quantity: u32) -> Result<DestinationGroup> {
        let group = DestinationGroup::for_channel(option.channel);
        self.add(group, &option.element_id, quantity)?;
        Ok(group)
    }

    /// 累加至指定群組
    ///
    /// 合併後數量超出 `u32` 時返回 [`PabError::QuantityOverflow`]，群組不變。
    pub fn add(&mut self, group: DestinationGroup, element_id: &str, quantity: u32) -> Result<()> {
        let target = self.group_mut(group);
        match target
            .allocations
            .iter_mut()
            .find(|a| a.element_id == element_id)
        {
            Some(existing) => {
                tracing::debug!(
                    "合併 {} 至 {}: {} + {}",
                    element_id,
                    group,
                    existing.quantity,
                    quantity
                );
                let current = existing.quantity;
                existing.quantity =
                    current
                        .checked_add(quantity)
                        .ok_or_else(|| PabError::QuantityOverflow {
                            element_id: element_id.to_string(),
                            existing: current,
                            added: quantity,
                        })?;
            }
            None => target.allocations.push(Allocation::new(element_id, quantity)),
        }
        Ok(())
    }

    /// 取得群組
    pub fn group(&self, group: DestinationGroup) -> &AllocationGroup {
        match group {
            DestinationGroup::Bestseller => &self.bestseller,
            DestinationGroup::Standard => &self.standard,
        }
    }

    fn group_mut(&mut self, group: DestinationGroup) -> &mut AllocationGroup {
        match group {
            DestinationGroup::Bestseller => &mut self.bestseller,
            DestinationGroup::Standard => &mut self.standard,
        }
    }

    /// 所有群組（固定順序）
    pub fn groups(&self) -> [&AllocationGroup; 2] {
        [&self.bestseller, &self.standard]
    }

    /// 當下快照，供決勝使用
    pub fn snapshot(&self) -> GroupSnapshots {
        let snap = |g: DestinationGroup| {
            let group = self.group(g);
            GroupSnapshot {
                lots: group.lots(),
                quantity: group.total_quantity(),
            }
        };
        GroupSnapshots {
            bestseller: snap(DestinationGroup::Bestseller),
            standard: snap(DestinationGroup::Standard),
        }
    }

    /// 所有群組累計數量
    pub fn total_quantity(&self) -> u64 {
        self.groups().iter().map(|g| g.total_quantity()).sum()
    }

    /// 所有群組批數
    pub fn total_lots(&self) -> usize {
        self.groups().iter().map(|g| g.lots()).sum()
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}
