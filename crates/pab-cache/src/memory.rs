//! 記憶體快取（測試與試算用）

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use pab_core::{CatalogMapping, LotListing, SaleStatus};

use crate::error::{CacheError, CacheResult};
use crate::store::{log_insert, CatalogCache, InsertOutcome};

#[derive(Default)]
struct Tables {
    /// 以元件編號為主鍵
    mappings: BTreeMap<String, CatalogMapping>,
    statuses: BTreeMap<String, SaleStatus>,
    lots: BTreeMap<(String, String), LotListing>,
}

/// 記憶體快取
#[derive(Default)]
pub struct MemoryCache {
    tables: Mutex<Tables>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_tables(&self) -> CacheResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|e| CacheError::Lock(e.to_string()))
    }
}

impl CatalogCache for MemoryCache {
    fn lookup_mappings(&self, design_id: &str) -> CacheResult<Option<Vec<CatalogMapping>>> {
        let tables = self.get_tables()?;
        let mut rows: Vec<CatalogMapping> = tables
            .mappings
            .values()
            .filter(|m| m.design_id == design_id)
            .cloned()
            .collect();

        if rows.is_empty() {
            return Ok(None);
        }
        rows.sort_by(|a, b| (a.color_id, &a.element_id).cmp(&(b.color_id, &b.element_id)));
        Ok(Some(rows))
    }

    fn lookup_status(&self, element_id: &str) -> CacheResult<Option<SaleStatus>> {
        Ok(self.get_tables()?.statuses.get(element_id).cloned())
    }

    fn insert_mapping(&self, mapping: &CatalogMapping) -> CacheResult<InsertOutcome> {
        let mut tables = self.get_tables()?;
        let outcome = if tables.mappings.contains_key(&mapping.element_id) {
            InsertOutcome::Skipped
        } else {
            tables
                .mappings
                .insert(mapping.element_id.clone(), mapping.clone());
            InsertOutcome::Inserted
        };
        log_insert("對應", &mapping.element_id, outcome);
        Ok(outcome)
    }

    fn insert_status(&self, status: &SaleStatus) -> CacheResult<InsertOutcome> {
        let mut tables = self.get_tables()?;
        let outcome = if tables.statuses.contains_key(&status.element_id) {
            InsertOutcome::Skipped
        } else {
            tables
                .statuses
                .insert(status.element_id.clone(), status.clone());
            InsertOutcome::Inserted
        };
        log_insert("販售狀態", &status.element_id, outcome);
        Ok(outcome)
    }

    fn lookup_lot(&self, store_id: &str, lot_id: &str) -> CacheResult<Option<LotListing>> {
        let key = (store_id.to_string(), lot_id.to_string());
        Ok(self.get_tables()?.lots.get(&key).cloned())
    }

    fn insert_lot(&self, listing: &LotListing) -> CacheResult<InsertOutcome> {
        let mut tables = self.get_tables()?;
        let key = (listing.store_id.clone(), listing.lot_id.clone());
        let outcome = if tables.lots.contains_key(&key) {
            InsertOutcome::Skipped
        } else {
            tables.lots.insert(key, listing.clone());
            InsertOutcome::Inserted
        };
        log_insert(
            "批次",
            &format!("{}/{}", listing.store_id, listing.lot_id),
            outcome,
        );
        Ok(outcome)
    }

    fn purge_mappings(&self) -> CacheResult<usize> {
        let mut tables = self.get_tables()?;
        let count = tables.mappings.len();
        tables.mappings.clear();
        Ok(count)
    }

    fn purge_statuses(&self) -> CacheResult<usize> {
        let mut tables = self.get_tables()?;
        let count = tables.statuses.len();
        tables.statuses.clear();
        Ok(count)
    }

    fn purge_lots(&self) -> CacheResult<usize> {
        let mut tables = self.get_tables()?;
        let count = tables.lots.len();
        tables.lots.clear();
        Ok(count)
    }
}
