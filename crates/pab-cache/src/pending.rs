//! 未命中鍵追蹤

use std::collections::BTreeSet;

use crate::error::CacheResult;
use crate::store::CatalogCache;

/// 待查詢鍵追蹤器
///
/// 排序且去重，使每次執行的請求順序固定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingKeys<K: Ord + Clone = String> {
    pending: BTreeSet<K>,
}

impl<K: Ord + Clone> PendingKeys<K> {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self {
            pending: BTreeSet::new(),
        }
    }

    /// 標記為待查詢
    pub fn mark(&mut self, key: K) {
        self.pending.insert(key);
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// 所有待查詢鍵（已排序）
    pub fn keys(&self) -> Vec<K> {
        self.pending.iter().cloned().collect()
    }
}

impl<K: Ord + Clone> Default for PendingKeys<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingKeys<String> {
    /// 沒有任何對應列的設計編號
    pub fn missing_designs<'a>(
        cache: &dyn CatalogCache,
        design_ids: impl IntoIterator<Item = &'a str>,
    ) -> CacheResult<Self> {
        let mut pending = Self::new();
        for design_id in design_ids {
            if cache.lookup_mappings(design_id)?.is_none() {
                pending.mark(design_id.to_string());
            }
        }
        Ok(pending)
    }

    /// 沒有販售狀態的元件編號
    pub fn missing_statuses<'a>(
        cache: &dyn CatalogCache,
        element_ids: impl IntoIterator<Item = &'a str>,
    ) -> CacheResult<Self> {
        let mut pending = Self::new();
        for element_id in element_ids {
            if cache.lookup_status(element_id)?.is_none() {
                pending.mark(element_id.to_string());
            }
        }
        Ok(pending)
    }
}

impl PendingKeys<(String, String)> {
    /// 尚未快取的（店家, 批號）
    pub fn missing_lots<'a>(
        cache: &dyn CatalogCache,
        lots: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> CacheResult<Self> {
        let mut pending = Self::new();
        for (store_id, lot_id) in lots {
            if cache.lookup_lot(store_id, lot_id)?.is_none() {
                pending.mark((store_id.to_string(), lot_id.to_string()));
            }
        }
        Ok(pending)
    }
}
