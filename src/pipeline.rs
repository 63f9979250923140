//! 命令流程：convert、save-money、merge、purge、import-mappings

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use pab_cache::{CacheFiller, CatalogCache, FillReport, PendingKeys};
use pab_calc::{
    ArbitrageResult, CartArbitrator, CombinedOrder, DecisionSource, OrderPartitioner,
    ReconcileResult, Reconciler, RunSummary,
};
use pab_core::{
    CartLot, Condition, LotResolver, MappingResolver, PartKey, PricedLot, ReconcileConfig,
    Requirement, StatusResolver,
};
use pab_io::OutputNames;
use rust_decimal::Decimal;
use serde::Serialize;

/// 外部查詢端
pub struct Resolvers<'a> {
    pub mappings: &'a dyn MappingResolver,
    pub statuses: &'a dyn StatusResolver,
    pub lots: &'a dyn LotResolver,
}

/// 目錄填充報告
#[derive(Debug, Clone, Default)]
pub struct CatalogFill {
    pub mappings: FillReport,
    pub statuses: FillReport,
}

/// convert 執行結果
#[derive(Debug)]
pub struct ConvertReport {
    pub result: ReconcileResult,
    pub fill: CatalogFill,
    pub orders: usize,
    pub written: Vec<PathBuf>,
}

impl ConvertReport {
    /// 完成訊息
    pub fn describe(&self) -> String {
        completion_message(
            self.orders,
            self.result.warnings.len(),
            self.result.calculation_time_ms,
        )
    }
}

/// save-money 執行結果
#[derive(Debug)]
pub struct SaveMoneyReport {
    pub arbitrage: ArbitrageResult,
    pub lot_fill: FillReport,
    pub fill: CatalogFill,
    /// 無法取得市集資訊而原樣保留的批次
    pub unpriced: Vec<CartLot>,
    pub retained: Vec<CartLot>,
    pub written: Vec<PathBuf>,
}

#[derive(Serialize)]
struct SummaryFile<'a> {
    generated_at: String,
    input: String,
    summary: &'a RunSummary,
    warnings: &'a [pab_calc::ReconcileWarning],
}

/// 對帳流程
pub struct Pipeline<'a> {
    cache: &'a dyn CatalogCache,
    filler: CacheFiller,
    resolvers: Resolvers<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(cache: &'a dyn CatalogCache, filler: CacheFiller, resolvers: Resolvers<'a>) -> Self {
        Self {
            cache,
            filler,
            resolvers,
        }
    }

    /// 補齊零件的對應與販售狀態（屏障：返回時所有請求皆已完成）
    pub fn fill_catalog(&self, keys: &[PartKey]) -> anyhow::Result<CatalogFill> {
        // Step 1: 不重複的設計編號
        let designs: BTreeSet<&str> = keys.iter().map(|k| k.design_id.as_str()).collect();
        tracing::info!("Step 1 完成 - 設計編號 {} 個", designs.len());

        // Step 2: 尚未快取的設計
        let pending = PendingKeys::missing_designs(self.cache, designs.iter().copied())
            .context("讀取對應快取失敗")?;
        tracing::info!("Step 2 完成 - 需查詢設計 {} 個", pending.len());

        // Step 3: 查詢並寫入
        let mappings = self
            .filler
            .fill_mappings(self.cache, self.resolvers.mappings, &pending.keys());
        tracing::info!("Step 3 完成");

        // Step 4: 需求對應到的所有元件
        let mut elements = BTreeSet::new();
        for key in keys {
            if let Some(rows) = self
                .cache
                .mappings_for(&key.design_id, key.color_id)
                .context("讀取對應快取失敗")?
            {
                elements.extend(rows.into_iter().map(|m| m.element_id));
            }
        }
        tracing::info!("Step 4 完成 - 元件編號 {} 個", elements.len());

        // Step 5: 尚未快取販售狀態的元件
        let pending = PendingKeys::missing_statuses(self.cache, elements.iter().map(String::as_str))
            .context("讀取販售狀態快取失敗")?;
        tracing::info!("Step 5 完成 - 需查詢元件 {} 個", pending.len());

        // Step 6: 查詢並寫入
        let statuses = self
            .filler
            .fill_statuses(self.cache, self.resolvers.statuses, &pending.keys());
        tracing::info!("Step 6 完成");

        Ok(CatalogFill { mappings, statuses })
    }

    /// 零件清單 → 原廠訂單
    pub fn convert(
        &self,
        input: &Path,
        names: &OutputNames,
        config: &ReconcileConfig,
        source: Option<&mut dyn DecisionSource>,
    ) -> anyhow::Result<ConvertReport> {
        config.validate()?;

        // Step 0: 解析
        let partslist = pab_io::read_partslist(input)
            .with_context(|| format!("無法讀取零件清單 {}", input.display()))?;
        let requirements = partslist.requirements;
        tracing::info!("Step 0 完成 - {} 筆需求", requirements.len());

        let keys = part_keys(&requirements);
        let fill = self.fill_catalog(&keys)?;

        // Step 7: 分類、決勝、分配
        let index = self.cache.option_index(&keys).context("建立方案索引失敗")?;
        let result = Reconciler::new(config.clone()).reconcile(&requirements, &index, source)?;
        tracing::info!("Step 7 完成");

        // Step 8: 匯出
        std::fs::create_dir_all(names.dir())
            .with_context(|| format!("無法建立輸出目錄 {}", names.dir().display()))?;
        let mut written = Vec::new();

        if result.unavailable.is_empty() {
            tracing::info!("沒有原廠不販售的需求");
        } else {
            let path = names.not_available();
            pab_io::write_inventory_xml(&path, &result.unavailable, config.condition)?;
            written.push(path);
        }

        if !result.unresolved.is_empty() {
            let path = names.unresolved();
            pab_io::write_inventory_xml(&path, &result.unresolved, config.condition)?;
            tracing::warn!(
                "{} 筆需求無法判定，已寫入 {}，請稍後重新執行",
                result.unresolved.len(),
                path.display()
            );
            written.push(path);
        }

        let orders = result.orders(config.max_lots_per_shipment);
        written.extend(write_orders(&orders, |i| names.order_csv(i), |i| names.order_json(i))?);
        tracing::info!("Step 8 完成 - 寫出 {} 個檔案", written.len());

        written.push(write_summary(&names.summary(), input, &result.summary, &result.warnings)?);
        log_summary(&result.summary);

        Ok(ConvertReport {
            orders: orders.iter().filter(|o| !o.is_empty()).count(),
            result,
            fill,
            written,
        })
    }

    /// 市集購物車 → 較便宜的批次改向原廠
    pub fn save_money(
        &self,
        input: &Path,
        names: &OutputNames,
        config: &ReconcileConfig,
    ) -> anyhow::Result<SaveMoneyReport> {
        config.validate()?;

        // Step 0: 解析購物車
        let cart = pab_io::read_cart(input)
            .with_context(|| format!("無法讀取購物車 {}", input.display()))?;
        tracing::info!("Step 0 完成 - {} 批", cart.len());

        // 批次資訊
        let lot_keys: Vec<(&str, &str)> = cart
            .iter()
            .map(|lot| (lot.store_id.as_str(), lot.lot_id.as_str()))
            .collect();
        let pending = PendingKeys::missing_lots(self.cache, lot_keys.iter().copied())
            .context("讀取批次快取失敗")?;
        let lot_fill = self
            .filler
            .fill_lots(self.cache, self.resolvers.lots, &pending.keys());

        let mut priced = Vec::new();
        let mut unpriced = Vec::new();
        for lot in &cart {
            match self
                .cache
                .lookup_lot(&lot.store_id, &lot.lot_id)
                .context("讀取批次快取失敗")?
            {
                Some(listing) => priced.push(PricedLot::from_listing(lot.clone(), &listing)),
                None => {
                    tracing::warn!("批次 {}/{} 無市集資訊，原樣保留", lot.store_id, lot.lot_id);
                    unpriced.push(lot.clone());
                }
            }
        }

        let keys: Vec<PartKey> = priced
            .iter()
            .map(|p| p.part.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let fill = self.fill_catalog(&keys)?;

        // 比價
        let index = self.cache.option_index(&keys).context("建立方案索引失敗")?;
        let arbitrage = CartArbitrator::arbitrate(&priced, &index);

        // 依購物車原始順序保留
        let kept: HashSet<(&str, &str)> = arbitrage
            .retained
            .iter()
            .map(|p| (p.lot.store_id.as_str(), p.lot.lot_id.as_str()))
            .chain(unpriced.iter().map(|l| (l.store_id.as_str(), l.lot_id.as_str())))
            .collect();
        let retained: Vec<CartLot> = cart
            .iter()
            .filter(|lot| kept.contains(&(lot.store_id.as_str(), lot.lot_id.as_str())))
            .cloned()
            .collect();

        // 匯出
        std::fs::create_dir_all(names.dir())
            .with_context(|| format!("無法建立輸出目錄 {}", names.dir().display()))?;
        let shipments: Vec<_> = arbitrage
            .migrated
            .groups()
            .iter()
            .map(|g| OrderPartitioner::partition_group(g, config.max_lots_per_shipment))
            .collect();
        let orders = OrderPartitioner::pair(&shipments);
        let mut written = write_orders(&orders, |i| names.pab_order_csv(i), |i| names.pab_order_json(i))?;

        let path = names.retained_cart();
        pab_io::write_cart(&path, &retained)?;
        written.push(path);

        let cart_quantity: u64 = cart.iter().map(|l| u64::from(l.quantity)).sum();
        let retained_quantity: u64 = retained.iter().map(|l| u64::from(l.quantity)).sum();
        let migrated_quantity = arbitrage.migrated.total_quantity();
        if cart_quantity != retained_quantity + migrated_quantity {
            tracing::error!(
                "數量不平衡: 購物車 {}，保留 {}，改向原廠 {}",
                cart_quantity,
                retained_quantity,
                migrated_quantity
            );
        }
        tracing::info!(
            "保留 {} 批（{} 件，其中 {} 批無市集資訊），改向原廠 {} 件，預估節省 {}",
            retained.len(),
            retained_quantity,
            unpriced.len(),
            migrated_quantity,
            format_cents(arbitrage.estimated_savings)
        );

        Ok(SaveMoneyReport {
            arbitrage,
            lot_fill,
            fill,
            unpriced,
            retained,
            written,
        })
    }
}

/// 清空快取表
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeTables {
    pub mappings: bool,
    pub statuses: bool,
    pub lots: bool,
}

pub fn purge(cache: &dyn CatalogCache, tables: PurgeTables) -> anyhow::Result<usize> {
    let mut deleted = 0;
    if tables.mappings {
        deleted += cache.purge_mappings()?;
    }
    if tables.statuses {
        deleted += cache.purge_statuses()?;
    }
    if tables.lots {
        deleted += cache.purge_lots()?;
    }
    if tables == PurgeTables::default() {
        tracing::warn!("未指定要清空的表");
    }
    Ok(deleted)
}

/// 從 CSV 對照表匯入
pub fn import_mappings(cache: &dyn CatalogCache, path: &Path) -> anyhow::Result<(usize, usize)> {
    let table = pab_fetch::MappingTable::from_path(path)
        .with_context(|| format!("無法讀取對照表 {}", path.display()))?;

    let mut inserted = 0;
    let mut skipped = 0;
    for mapping in table.rows() {
        if cache.insert_mapping(mapping)?.is_inserted() {
            inserted += 1;
        } else {
            skipped += 1;
        }
    }
    tracing::info!("匯入對照 {} 列，寫入 {}，略過 {}", table.len(), inserted, skipped);
    Ok((inserted, skipped))
}

/// 合併多份零件清單並寫出
pub fn merge(output: &Path, inputs: &[PathBuf], condition: Condition) -> anyhow::Result<Vec<Requirement>> {
    pab_io::require_extension(output, "xml")?;
    for input in inputs {
        pab_io::require_extension(input, "xml")?;
    }

    let mut lists = Vec::with_capacity(inputs.len());
    for input in inputs {
        let partslist = pab_io::read_partslist(input)
            .with_context(|| format!("無法讀取零件清單 {}", input.display()))?;
        tracing::info!("{}: {} 筆", input.display(), partslist.requirements.len());
        lists.push(partslist.requirements);
    }

    let merged = pab_io::merge_partslists(&lists)?;
    pab_io::write_inventory_xml(output, &merged, condition)?;
    Ok(merged)
}

/// 讀取 JSON 配置檔
pub fn load_config(path: &Path) -> anyhow::Result<ReconcileConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("無法讀取配置 {}", path.display()))?;
    let config: ReconcileConfig =
        serde_json::from_str(&text).with_context(|| format!("配置格式錯誤 {}", path.display()))?;
    Ok(config)
}

/// 零件需求的不重複鍵（依首次出現順序）
fn part_keys(requirements: &[Requirement]) -> Vec<PartKey> {
    let mut seen = HashSet::new();
    requirements
        .iter()
        .filter(|r| r.is_part())
        .map(Requirement::key)
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// 寫出非空訂單（1 起算）
fn write_orders(
    orders: &[CombinedOrder],
    csv_path: impl Fn(usize) -> PathBuf,
    json_path: impl Fn(usize) -> PathBuf,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for order in orders {
        if order.is_empty() {
            continue;
        }
        let allocations = order.allocations();
        let number = order.index + 1;
        let csv = csv_path(number);
        let json = json_path(number);
        pab_io::write_csv(&csv, &allocations)?;
        pab_io::write_json(&json, &allocations)?;
        tracing::info!("訂單 {}: {} 批", number, order.lots());
        written.push(csv);
        written.push(json);
    }
    Ok(written)
}

fn write_summary(
    path: &Path,
    input: &Path,
    summary: &RunSummary,
    warnings: &[pab_calc::ReconcileWarning],
) -> anyhow::Result<PathBuf> {
    let file = SummaryFile {
        generated_at: Local::now().to_rfc3339(),
        input: input.display().to_string(),
        summary,
        warnings,
    };
    std::fs::write(path, serde_json::to_string_pretty(&file)?)
        .with_context(|| format!("無法寫入 {}", path.display()))?;
    Ok(path.to_path_buf())
}

fn log_summary(summary: &RunSummary) {
    tracing::info!(
        "輸入 {} 件：分配 {}，不販售 {}，無法判定 {}，排除 {}",
        summary.input_quantity,
        summary.allocated_quantity,
        summary.unavailable_quantity,
        summary.unresolved_quantity,
        summary.excluded_quantity
    );
    for group in &summary.groups {
        tracing::info!("{}: {} 批，{} 件", group.group, group.lots, group.quantity);
    }
    if !summary.is_balanced() {
        tracing::error!("數量不平衡，請檢查日誌");
    }
}

/// 分 → 金額字串
fn completion_message(orders: usize, warnings: usize, elapsed_ms: Option<u128>) -> String {
    format!(
        "完成：{} 張訂單，{} 個警告，耗時 {} ms",
        orders,
        warnings,
        elapsed_ms.unwrap_or_default()
    )
}

fn format_cents(cents: Decimal) -> String {
    format!("{:.2}", cents / Decimal::ONE_HUNDRED)
}
