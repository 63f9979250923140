//! 零件清單對帳主流程

use pab_core::{OptionIndex, OptionLookup, ReconcileConfig, Requirement, SaleOption};

use crate::accumulator::Accumulator;
use crate::partition::{CombinedOrder, OrderPartitioner};
use crate::resolution::{Classification, ResolutionEngine};
use crate::tie_break::{DecisionSource, TieBreaker};
use crate::{ReconcileWarning, RunSummary};

/// 對帳結果
#[derive(Debug, Clone)]
pub struct ReconcileResult {
    /// 原廠不販售（原樣回寫市集清單）
    pub unavailable: Vec<Requirement>,

    /// 目錄資料不完整，本次無法判定
    pub unresolved: Vec<Requirement>,

    /// 因資料完整性或決勝失敗而排除
    pub excluded: Vec<Requirement>,

    /// 各目的群組分配
    pub groups: Accumulator,

    /// 警告信息
    pub warnings: Vec<ReconcileWarning>,

    /// 數量統計
    pub summary: RunSummary,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl ReconcileResult {
    /// 分段並依序號配對成訂單
    pub fn orders(&self, max_lots: usize) -> Vec<CombinedOrder> {
        let shipments: Vec<_> = self
            .groups
            .groups()
            .iter()
            .map(|g| OrderPartitioner::partition_group(g, max_lots))
            .collect();
        OrderPartitioner::pair(&shipments)
    }
}

/// 對帳器
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    /// 創建新的對帳器
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    /// 主對帳入口
    ///
    /// 先分配單一方案的需求，再依輸入順序對雙方案需求決勝，
    /// 使「較大群組」類規則看到的是所有單一方案分配後的群組狀態。
    pub fn reconcile(
        &self,
        requirements: &[Requirement],
        index: &OptionIndex,
        mut source: Option<&mut dyn DecisionSource>,
    ) -> pab_core::Result<ReconcileResult> {
        self.config.validate()?;

        tracing::info!("開始對帳：需求 {} 筆", requirements.len());
        let start_time = std::time::Instant::now();

        let mut unavailable = Vec::new();
        let mut unresolved = Vec::new();
        let mut excluded = Vec::new();
        let mut warnings = Vec::new();
        let mut single: Vec<(&Requirement, SaleOption)> = Vec::new();
        let mut ambiguous: Vec<(&Requirement, SaleOption, SaleOption)> = Vec::new();

        // Step 1: 分類
        tracing::debug!("Step 1: 分類");
        for requirement in requirements {
            if !requirement.is_part() {
                tracing::debug!(
                    "{} 不是零件（{}），視為原廠不販售",
                    requirement.key(),
                    requirement.item_type.code()
                );
                unavailable.push(requirement.clone());
                continue;
            }

            let options = match index.lookup(&requirement.key()) {
                OptionLookup::Resolved(options) => options,
                OptionLookup::Unresolved(reason) => {
                    warnings.push(ReconcileWarning::warning(requirement.key().to_string(), reason));
                    unresolved.push(requirement.clone());
                    continue;
                }
            };

            match ResolutionEngine::classify(requirement, options) {
                Classification::Unavailable => unavailable.push(requirement.clone()),
                Classification::Single(option) => single.push((requirement, option)),
                Classification::Ambiguous(a, b) => ambiguous.push((requirement, a, b)),
                Classification::Invalid(all) => {
                    warnings.push(ReconcileWarning::error(
                        requirement.key().to_string(),
                        format!("{} 個可販售方案，已排除", all.len()),
                    ));
                    excluded.push(requirement.clone());
                }
            }
        }
        tracing::info!(
            "分類完成：不販售 {} 筆，單一方案 {} 筆，雙方案 {} 筆，無法判定 {} 筆，排除 {} 筆",
            unavailable.len(),
            single.len(),
            ambiguous.len(),
            unresolved.len(),
            excluded.len()
        );

        // Step 2: 分配單一方案
        tracing::debug!("Step 2: 分配單一方案");
        let mut groups = Accumulator::new();
        for (requirement, option) in &single {
            if let Err(e) = groups.accumulate(option, requirement.quantity) {
                tracing::error!("需求 {} 無法分配: {}", requirement.key(), e);
                warnings.push(ReconcileWarning::error(requirement.key().to_string(), e.to_string()));
                excluded.push((*requirement).clone());
            }
        }

        // Step 3: 雙方案決勝
        tracing::debug!("Step 3: 雙方案決勝");
        for (requirement, a, b) in &ambiguous {
            let snapshots = groups.snapshot();
            let reborrowed = source
                .as_mut()
                .map(|s| &mut **s as &mut dyn DecisionSource);
            match TieBreaker::break_tie(
                requirement,
                a,
                b,
                self.config.tie_break,
                &snapshots,
                reborrowed,
            )
            .and_then(|option| groups.accumulate(&option, requirement.quantity))
            {
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("需求 {} 決勝或分配失敗: {}", requirement.key(), e);
                    warnings.push(ReconcileWarning::error(requirement.key().to_string(), e.to_string()));
                    excluded.push((*requirement).clone());
                }
            }
        }

        // Step 4: 統計
        let summary = RunSummary::new(requirements, &unavailable, &unresolved, &excluded, &groups);
        if !summary.is_balanced() {
            tracing::error!("數量不平衡: {:?}", summary);
        }

        tracing::info!("對帳完成，耗時 {:?}", start_time.elapsed());
        for group in groups.groups() {
            tracing::info!(
                "{}: {} 批，共 {} 件",
                group.group,
                group.lots(),
                group.total_quantity()
            );
        }

        Ok(ReconcileResult {
            unavailable,
            unresolved,
            excluded,
            groups,
            warnings,
            summary,
            calculation_time_ms: Some(start_time.elapsed().as_millis()),
        })
    }

    /// 配置
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }
}
