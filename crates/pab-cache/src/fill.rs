//! 快取填充（有界工作池）
//!
//! 每個鍵的查詢互相獨立；所有請求完成（成功或記錄失敗）後才返回，作為對帳前的屏障。

use std::time::{Duration, Instant};

use pab_core::{CatalogMapping, LotResolver, MappingResolver, ResolveError, SaleStatus, StatusResolver};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::error::CacheResult;
use crate::store::{CatalogCache, InsertOutcome};

/// 工作池配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillConfig {
    /// 並行工作執行緒數
    pub workers: usize,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self { workers: 8 }
    }
}

impl FillConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// 單一填充步驟的報告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    /// 請求的鍵數
    pub requested: usize,
    /// 新寫入的列數
    pub inserted: usize,
    /// 已存在而略過的列數
    pub skipped: usize,
    /// 查詢或寫入失敗的鍵（本次無法判定）
    pub failed: Vec<String>,
    pub elapsed: Duration,
}

impl FillReport {
    fn merge(&mut self, outcome: KeyOutcome) {
        match outcome {
            KeyOutcome::Done { inserted, skipped } => {
                self.inserted += inserted;
                self.skipped += skipped;
            }
            KeyOutcome::Failed(key) => self.failed.push(key),
        }
    }
}

enum KeyOutcome {
    Done { inserted: usize, skipped: usize },
    Failed(String),
}

impl KeyOutcome {
    fn single(outcome: InsertOutcome) -> Self {
        match outcome {
            InsertOutcome::Inserted => KeyOutcome::Done { inserted: 1, skipped: 0 },
            InsertOutcome::Skipped => KeyOutcome::Done { inserted: 0, skipped: 1 },
        }
    }
}

/// 快取填充器
pub struct CacheFiller {
    pool: ThreadPool,
}

impl CacheFiller {
    pub fn new(config: FillConfig) -> CacheResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers.max(1))
            .build()?;
        Ok(Self { pool })
    }

    /// 查詢設計編號的對應並寫入
    pub fn fill_mappings(
        &self,
        cache: &dyn CatalogCache,
        resolver: &dyn MappingResolver,
        design_ids: &[String],
    ) -> FillReport {
        self.run("對應", design_ids, |design_id| {
            let pairs = match resolver.resolve_mapping(design_id) {
                Ok(pairs) => pairs,
                Err(e) => {
                    tracing::error!("查詢設計 {} 失敗: {}", design_id, e);
                    return KeyOutcome::Failed(design_id.clone());
                }
            };
            if pairs.is_empty() {
                tracing::warn!("設計 {} 沒有任何元件對應", design_id);
            }

            let mut inserted = 0;
            let mut skipped = 0;
            for (color_id, element_id) in pairs {
                let mapping = CatalogMapping::new(design_id.as_str(), color_id, element_id);
                match cache.insert_mapping(&mapping) {
                    Ok(InsertOutcome::Inserted) => inserted += 1,
                    Ok(InsertOutcome::Skipped) => skipped += 1,
                    Err(e) => {
                        tracing::error!("寫入對應 {} 失敗: {}", mapping.element_id, e);
                        return KeyOutcome::Failed(design_id.clone());
                    }
                }
            }
            KeyOutcome::Done { inserted, skipped }
        })
    }

    /// 查詢元件編號的販售狀態並寫入
    ///
    /// 查無資料視為原廠不販售並快取；未知銷售通道為資料完整性錯誤，不快取。
    pub fn fill_statuses(
        &self,
        cache: &dyn CatalogCache,
        resolver: &dyn StatusResolver,
        element_ids: &[String],
    ) -> FillReport {
        self.run("販售狀態", element_ids, |element_id| {
            let status = match resolver.resolve_status(element_id) {
                Ok(status) => status,
                Err(ResolveError::NotFound(_)) => SaleStatus::not_sold(element_id.as_str()),
                Err(e @ ResolveError::UnknownChannel(_)) => {
                    tracing::error!("元件 {} 資料完整性錯誤: {}", element_id, e);
                    return KeyOutcome::Failed(element_id.clone());
                }
                Err(e) => {
                    tracing::error!("查詢元件 {} 失敗: {}", element_id, e);
                    return KeyOutcome::Failed(element_id.clone());
                }
            };

            match cache.insert_status(&status) {
                Ok(outcome) => KeyOutcome::single(outcome),
                Err(e) => {
                    tracing::error!("寫入販售狀態 {} 失敗: {}", element_id, e);
                    KeyOutcome::Failed(element_id.clone())
                }
            }
        })
    }

    /// 查詢店家批次並寫入
    pub fn fill_lots(
        &self,
        cache: &dyn CatalogCache,
        resolver: &dyn LotResolver,
        lots: &[(String, String)],
    ) -> FillReport {
        self.run("批次", lots, |(store_id, lot_id)| {
            let key = format!("{store_id}/{lot_id}");
            let listing = match resolver.resolve_lot(store_id, lot_id) {
                Ok(listing) => listing,
                Err(e) => {
                    tracing::error!("查詢批次 {} 失敗: {}", key, e);
                    return KeyOutcome::Failed(key);
                }
            };

            match cache.insert_lot(&listing) {
                Ok(outcome) => KeyOutcome::single(outcome),
                Err(e) => {
                    tracing::error!("寫入批次 {} 失敗: {}", key, e);
                    KeyOutcome::Failed(key)
                }
            }
        })
    }

    fn run<K, F>(&self, kind: &str, keys: &[K], work: F) -> FillReport
    where
        K: Sync,
        F: Fn(&K) -> KeyOutcome + Sync,
    {
        let start_time = Instant::now();
        let outcomes: Vec<KeyOutcome> = self.pool.install(|| keys.par_iter().map(&work).collect());

        let mut report = FillReport {
            requested: keys.len(),
            ..FillReport::default()
        };
        for outcome in outcomes {
            report.merge(outcome);
        }
        report.elapsed = start_time.elapsed();

        tracing::info!(
            "填充{}完成：請求 {}，寫入 {}，略過 {}，失敗 {}，耗時 {:?}",
            kind,
            report.requested,
            report.inserted,
            report.skipped,
            report.failed.len(),
            report.elapsed
        );
        report
    }
}
