//! 零件清單合併

use std::collections::HashMap;

use pab_core::{PartKey, Requirement};

use crate::error::{IoError, IoResult};

/// 合併多份零件清單
///
/// 相同設計/顏色的數量相加，保留首次出現的順序與其他欄位。
/// 相加超出 `u32` 時返回 [`IoError::QuantityOverflow`]。
pub fn merge_partslists(lists: &[Vec<Requirement>]) -> IoResult<Vec<Requirement>> {
    let mut merged: Vec<Requirement> = Vec::new();
    let mut positions: HashMap<PartKey, usize> = HashMap::new();

    for requirement in lists.iter().flatten() {
        let key = requirement.key();
        match positions.get(&key) {
            Some(&position) => {
                let existing = &mut merged[position];
                tracing::info!(
                    "合併 {}: {:>3} + {:>3}",
                    key,
                    existing.quantity,
                    requirement.quantity
                );
                existing.quantity = existing
                    .quantity
                    .checked_add(requirement.quantity)
                    .ok_or_else(|| IoError::QuantityOverflow(key.to_string()))?;
            }
            None => {
                positions.insert(key, merged.len());
                merged.push(requirement.clone());
            }
        }
    }

    tracing::info!("合併後共 {} 筆", merged.len());
    Ok(merged)
}
