//! 雙方案決勝

use pab_core::{DestinationGroup, PabError, Requirement, SaleOption, TieBreakPolicy};

/// 目的群組快照（批數與累計數量）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub lots: usize,
    pub quantity: u64,
}

/// 各目的群組快照
///
/// 由累加器在決勝當下產生並明確傳入，決勝不讀取任何共享狀態。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupSnapshots {
    pub bestseller: GroupSnapshot,
    pub standard: GroupSnapshot,
}

impl GroupSnapshots {
    pub fn get(&self, group: DestinationGroup) -> GroupSnapshot {
        match group {
            DestinationGroup::Bestseller => self.bestseller,
            DestinationGroup::Standard => self.standard,
        }
    }
}

/// 外部決策來源（人工或測試腳本）
pub trait DecisionSource {
    /// 呈現方案並取得回覆（1 起算的序號字串）；`None` 表示來源已無法再提供輸入
    fn choose(&mut self, requirement: &Requirement, options: &[SaleOption]) -> Option<String>;

    /// 通知回覆無效，將重新詢問
    fn reject(&mut self, _input: &str, _reason: &str) {}
}

/// 決勝器
pub struct TieBreaker;

impl TieBreaker {
    /// 在兩個方案間選擇
    ///
    /// 價格不同時較便宜者直接勝出；同價時套用 `policy`，未設定規則則失敗。
    pub fn break_tie(
        requirement: &Requirement,
        a: &SaleOption,
        b: &SaleOption,
        policy: Option<TieBreakPolicy>,
        snapshots: &GroupSnapshots,
        source: Option<&mut dyn DecisionSource>,
    ) -> pab_core::Result<SaleOption> {
        if a.price != b.price {
            let cheaper = if a.price < b.price { a } else { b };
            tracing::debug!(
                "需求 {}: {} ({} 分) 較便宜，自動選擇",
                requirement.key(),
                cheaper.element_id,
                cheaper.price
            );
            return Ok(cheaper.clone());
        }

        let policy = policy.ok_or_else(|| PabError::NoTieBreakPolicy(requirement.key().to_string()))?;

        let picked = match policy {
            TieBreakPolicy::PreferPrimaryChannel => {
                Self::by_channel(a, b, true).ok_or_else(|| Self::undecided(requirement, policy))?
            }
            TieBreakPolicy::PreferSecondaryChannel => {
                Self::by_channel(a, b, false).ok_or_else(|| Self::undecided(requirement, policy))?
            }
            TieBreakPolicy::PreferLargerDestinationGroup => {
                Self::by_group(a, b, snapshots, |s| s.lots as u64)
                    .ok_or_else(|| Self::undecided(requirement, policy))?
            }
            TieBreakPolicy::PreferLargerDestinationQuantity => {
                Self::by_group(a, b, snapshots, |s| s.quantity)
                    .ok_or_else(|| Self::undecided(requirement, policy))?
            }
            TieBreakPolicy::Interactive => {
                let source = source.ok_or_else(|| {
                    PabError::DecisionUnavailable(format!("{}: 未提供決策來源", requirement.key()))
                })?;
                Self::ask(requirement, a, b, source)?
            }
        };

        tracing::info!(
            "需求 {}: 同價 {} 分，依 {:?} 選擇 {}",
            requirement.key(),
            a.price,
            policy,
            picked.element_id
        );
        Ok(picked.clone())
    }

    fn by_channel<'a>(a: &'a SaleOption, b: &'a SaleOption, primary: bool) -> Option<&'a SaleOption> {
        match (a.is_primary_channel() == primary, b.is_primary_channel() == primary) {
            (true, false) => Some(a),
            (false, true) => Some(b),
            _ => None,
        }
    }

    fn by_group<'a>(
        a: &'a SaleOption,
        b: &'a SaleOption,
        snapshots: &GroupSnapshots,
        measure: impl Fn(&GroupSnapshot) -> u64,
    ) -> Option<&'a SaleOption> {
        let size_a = measure(&snapshots.get(DestinationGroup::for_channel(a.channel)));
        let size_b = measure(&snapshots.get(DestinationGroup::for_channel(b.channel)));
        match size_a.cmp(&size_b) {
            std::cmp::Ordering::Greater => Some(a),
            std::cmp::Ordering::Less => Some(b),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// 詢問決策來源直到取得有效序號
    fn ask<'a>(
        requirement: &Requirement,
        a: &'a SaleOption,
        b: &'a SaleOption,
        source: &mut dyn DecisionSource,
    ) -> pab_core::Result<&'a SaleOption> {
        let options = [a.clone(), b.clone()];
        loop {
            let input = source.choose(requirement, &options).ok_or_else(|| {
                PabError::DecisionUnavailable(format!("{}: 決策來源沒有回覆", requirement.key()))
            })?;

            match input.trim().parse::<usize>() {
                Ok(1) => return Ok(a),
                Ok(2) => return Ok(b),
                Ok(n) => {
                    tracing::warn!("無效的選項: {}", n);
                    source.reject(&input, "序號超出範圍");
                }
                Err(e) => {
                    tracing::warn!("無效的選項: {:?} ({})", input, e);
                    source.reject(&input, "不是數字");
                }
            }
        }
    }

    fn undecided(requirement: &Requirement, policy: TieBreakPolicy) -> PabError {
        PabError::TieBreakUndecided(format!("{} ({:?})", requirement.key(), policy))
    }
}
