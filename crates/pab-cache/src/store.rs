//! 目錄快取介面

use pab_core::{CatalogMapping, LotListing, OptionIndex, PartKey, SaleStatus};

use crate::error::CacheResult;

/// 冪等寫入結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// 已存在，未覆寫
    Skipped,
}

impl InsertOutcome {
    pub fn is_inserted(self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

/// 目錄快取
///
/// 查詢返回 `None` 表示未命中；所有寫入皆為「不存在才寫入」，可由多個工作執行緒並行呼叫。
pub trait CatalogCache: Send + Sync {
    /// 某設計的所有（顏色, 元件）對應；該設計沒有任何快取列時返回 `None`
    fn lookup_mappings(&self, design_id: &str) -> CacheResult<Option<Vec<CatalogMapping>>>;

    fn lookup_status(&self, element_id: &str) -> CacheResult<Option<SaleStatus>>;

    fn insert_mapping(&self, mapping: &CatalogMapping) -> CacheResult<InsertOutcome>;

    fn insert_status(&self, status: &SaleStatus) -> CacheResult<InsertOutcome>;

    fn lookup_lot(&self, store_id: &str, lot_id: &str) -> CacheResult<Option<LotListing>>;

    fn insert_lot(&self, listing: &LotListing) -> CacheResult<InsertOutcome>;

    /// 清空對應表，返回刪除列數
    fn purge_mappings(&self) -> CacheResult<usize>;

    fn purge_statuses(&self) -> CacheResult<usize>;

    fn purge_lots(&self) -> CacheResult<usize>;

    /// 指定設計/顏色的對應；設計未快取時返回 `None`
    fn mappings_for(&self, design_id: &str, color_id: u32) -> CacheResult<Option<Vec<CatalogMapping>>> {
        Ok(self.lookup_mappings(design_id)?.map(|rows| {
            rows.into_iter()
                .filter(|m| m.color_id == color_id)
                .collect()
        }))
    }

    /// 由快取內容建立方案索引
    ///
    /// 設計沒有快取列，或任何對應元件缺少販售狀態時，該鍵標記為無法判定。
    fn option_index(&self, keys: &[PartKey]) -> CacheResult<OptionIndex> {
        let mut index = OptionIndex::new();

        'keys: for key in keys {
            let Some(mappings) = self.mappings_for(&key.design_id, key.color_id)? else {
                index.mark_unresolved(key.clone(), format!("設計 {} 尚無對應資料", key.design_id));
                continue;
            };

            let mut options = Vec::new();
            for mapping in &mappings {
                match self.lookup_status(&mapping.element_id)? {
                    Some(status) => options.extend(status.to_option()),
                    None => {
                        index.mark_unresolved(
                            key.clone(),
                            format!("元件 {} 尚無販售狀態", mapping.element_id),
                        );
                        continue 'keys;
                    }
                }
            }
            index.insert_resolved(key.clone(), options);
        }

        tracing::debug!("方案索引: {} 個鍵", index.len());
        Ok(index)
    }
}

pub(crate) fn log_insert(kind: &str, key: &str, outcome: InsertOutcome) {
    match outcome {
        InsertOutcome::Inserted => tracing::debug!("寫入{}: {}", kind, key),
        InsertOutcome::Skipped => tracing::debug!("略過{}（已存在）: {}", kind, key),
    }
}
