//! 集成測試

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use pab::{Pipeline, Resolvers};
use pab_cache::{CacheFiller, CatalogCache, FillConfig, MemoryCache, SqliteCache};
use pab_calc::DecisionSource;
use pab_core::{
    Allocation, CartLot, Condition, LotListing, LotResolver, MappingResolver, ReconcileConfig,
    Requirement, ResolveError, SaleChannel, SaleOption, SaleStatus, StatusResolver,
    TieBreakPolicy,
};
use rust_decimal::Decimal;

const PARTSLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<INVENTORY>
<ITEM><ITEMTYPE>P</ITEMTYPE><ITEMID>3001</ITEMID><COLOR>5</COLOR><MINQTY>10</MINQTY></ITEM>
<ITEM><ITEMTYPE>P</ITEMTYPE><ITEMID>3002</ITEMID><COLOR>1</COLOR><MINQTY>4</MINQTY></ITEM>
<ITEM><ITEMTYPE>P</ITEMTYPE><ITEMID>3003</ITEMID><COLOR>1</COLOR><MINQTY>2</MINQTY></ITEM>
<ITEM><ITEMTYPE>P</ITEMTYPE><ITEMID>3004</ITEMID><COLOR>2</COLOR><MINQTY>3</MINQTY></ITEM>
<ITEM><ITEMTYPE>M</ITEMTYPE><ITEMID>sw0001</ITEMID><COLOR>0</COLOR><MINQTY>1</MINQTY></ITEM>
</INVENTORY>
"#;

/// 記憶體對照查詢，記錄呼叫次數
#[derive(Default)]
struct FakeMappings {
    rows: HashMap<String, Vec<(u32, String)>>,
    calls: AtomicUsize,
}

impl FakeMappings {
    fn catalog() -> Self {
        let mut rows = HashMap::new();
        rows.insert(
            "3001".to_string(),
            vec![(5, "300121".to_string()), (5, "4211111".to_string())],
        );
        rows.insert("3002".to_string(), vec![(1, "300201".to_string())]);
        rows.insert("3003".to_string(), vec![(1, "300301".to_string())]);
        Self {
            rows,
            calls: AtomicUsize::new(0),
        }
    }
}

impl MappingResolver for FakeMappings {
    fn resolve_mapping(&self, design_id: &str) -> Result<Vec<(u32, String)>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rows
            .get(design_id)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(design_id.to_string()))
    }
}

#[derive(Default)]
struct FakeStatuses {
    calls: AtomicUsize,
}

impl StatusResolver for FakeStatuses {
    fn resolve_status(&self, element_id: &str) -> Result<SaleStatus, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match element_id {
            "300121" => Ok(SaleStatus::sold(element_id, SaleChannel::Bestseller, 450, 200)),
            "4211111" => Ok(SaleStatus::sold(element_id, SaleChannel::Standard, 450, 50)),
            "300201" => Ok(SaleStatus::sold(element_id, SaleChannel::Standard, 450, 200)),
            "300301" => Ok(SaleStatus::not_sold(element_id)),
            other => Err(ResolveError::Transport(format!("連線逾時: {other}"))),
        }
    }
}

struct FakeLots;

impl LotResolver for FakeLots {
    fn resolve_lot(&self, store_id: &str, lot_id: &str) -> Result<LotListing, ResolveError> {
        let (design_id, color_id, price) = match lot_id {
            "555" => ("3001", 5, 500),
            "556" => ("3002", 1, 400),
            _ => return Err(ResolveError::NotFound(format!("{store_id}/{lot_id}"))),
        };
        Ok(LotListing {
            store_id: store_id.to_string(),
            lot_id: lot_id.to_string(),
            design_id: design_id.to_string(),
            color_id,
            unit_price: Decimal::from(price),
        })
    }
}

/// 依序回覆的決策來源
struct Scripted {
    replies: Vec<String>,
    rejected: usize,
}

impl Scripted {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().rev().map(|s| s.to_string()).collect(),
            rejected: 0,
        }
    }
}

impl DecisionSource for Scripted {
    fn choose(&mut self, _requirement: &Requirement, _options: &[SaleOption]) -> Option<String> {
        self.replies.pop()
    }

    fn reject(&mut self, _input: &str, _reason: &str) {
        self.rejected += 1;
    }
}

fn filler() -> CacheFiller {
    CacheFiller::new(FillConfig::default().with_workers(2)).unwrap()
}

fn write_partslist(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("castle.xml");
    std::fs::write(&path, PARTSLIST).unwrap();
    path
}

fn read_allocations(path: &Path) -> Vec<Allocation> {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_convert_full_pipeline() {
    pab::logging::init_test();

    // 1. 輸入與查詢端
    let dir = tempfile::tempdir().unwrap();
    let input = write_partslist(dir.path());
    let names = pab_io::OutputNames::new(&input, None);
    let cache = MemoryCache::new();
    let mappings = FakeMappings::catalog();
    let statuses = FakeStatuses::default();
    let pipeline = Pipeline::new(
        &cache,
        filler(),
        Resolvers {
            mappings: &mappings,
            statuses: &statuses,
            lots: &FakeLots,
        },
    );

    // 2. 同價時人工選擇：先輸入無效值，再選第 2 個方案（次要通道）
    let config = ReconcileConfig::new().with_tie_break(TieBreakPolicy::Interactive);
    let mut source = Scripted::new(&["x", "2"]);

    let report = pipeline
        .convert(&input, &names, &config, Some(&mut source as &mut dyn DecisionSource))
        .unwrap();

    // 3. 驗證分類與統計
    let summary = &report.result.summary;
    assert_eq!(summary.input_quantity, 20);
    assert_eq!(summary.allocated_quantity, 14);
    assert_eq!(summary.unavailable_quantity, 3);
    assert_eq!(summary.unresolved_quantity, 3);
    assert_eq!(summary.excluded_quantity, 0);
    assert!(summary.is_balanced());
    assert_eq!(source.rejected, 1);

    assert!(report.describe().starts_with(&format!("完成：{} 張訂單", report.orders)));
    assert_eq!(report.fill.mappings.requested, 4);
    assert_eq!(report.fill.mappings.failed, vec!["3004".to_string()]);
    assert_eq!(report.fill.statuses.requested, 4);
    assert_eq!(report.result.unresolved, vec![Requirement::new("3004", 2, 3)]);

    // 4. 驗證輸出檔
    assert_eq!(report.orders, 1);
    assert_eq!(
        read_allocations(&names.order_json(1)),
        vec![Allocation::new("300201", 4), Allocation::new("4211111", 10)]
    );
    assert!(names.order_csv(1).exists());
    assert!(!names.order_json(2).exists());

    let not_available = pab_io::read_partslist(names.not_available()).unwrap();
    assert_eq!(not_available.requirements.len(), 2);
    assert_eq!(not_available.requirements[0], Requirement::new("3003", 1, 2));

    let unresolved = pab_io::read_partslist(names.unresolved()).unwrap();
    assert_eq!(unresolved.requirements, vec![Requirement::new("3004", 2, 3)]);

    let summary_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(names.summary()).unwrap()).unwrap();
    assert_eq!(summary_json["summary"]["allocated_quantity"], 14);
}

#[test]
fn test_convert_without_policy_excludes_ties() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_partslist(dir.path());
    let out_dir = dir.path().join("out");
    let names = pab_io::OutputNames::new(&input, Some(&out_dir));
    let cache = MemoryCache::new();
    let mappings = FakeMappings::catalog();
    let statuses = FakeStatuses::default();
    let pipeline = Pipeline::new(
        &cache,
        filler(),
        Resolvers {
            mappings: &mappings,
            statuses: &statuses,
            lots: &FakeLots,
        },
    );

    let report = pipeline
        .convert(&input, &names, &ReconcileConfig::new(), None)
        .unwrap();

    // 3001/5 同價且未設定規則：排除，其餘照常
    assert_eq!(report.result.excluded, vec![Requirement::new("3001", 5, 10)]);
    assert_eq!(report.result.summary.allocated_quantity, 4);
    assert_eq!(report.result.summary.excluded_quantity, 10);
    assert!(report.result.summary.is_balanced());
    assert!(out_dir.join("castle_order1.json").exists());
}

#[test]
fn test_rerun_uses_sqlite_cache() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_partslist(dir.path());
    let names = pab_io::OutputNames::new(&input, None);
    let cache = SqliteCache::open(dir.path().join("part_info.db")).unwrap();
    let mappings = FakeMappings::catalog();
    let statuses = FakeStatuses::default();
    let pipeline = Pipeline::new(
        &cache,
        filler(),
        Resolvers {
            mappings: &mappings,
            statuses: &statuses,
            lots: &FakeLots,
        },
    );
    let config = ReconcileConfig::new()
        .with_tie_break(TieBreakPolicy::PreferPrimaryChannel)
        .with_max_lots(1);

    let first = pipeline.convert(&input, &names, &config, None).unwrap();
    assert_eq!(mappings.calls.load(Ordering::SeqCst), 4);
    assert_eq!(statuses.calls.load(Ordering::SeqCst), 4);

    // 每張訂單一批：主要通道 1 批、次要通道 1 批，配對為 1 張
    assert_eq!(first.orders, 1);
    assert_eq!(
        read_allocations(&names.order_json(1)),
        vec![Allocation::new("300121", 10), Allocation::new("300201", 4)]
    );

    // 第二次只重新查詢沒有對應的設計
    let second = pipeline.convert(&input, &names, &config, None).unwrap();
    assert_eq!(mappings.calls.load(Ordering::SeqCst), 5);
    assert_eq!(statuses.calls.load(Ordering::SeqCst), 4);
    assert_eq!(second.result.summary, first.result.summary);
}

#[test]
fn test_save_money_migrates_cheaper_lots() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("wanted.cart");
    let cart = vec![
        CartLot::new("100", "555", 6).with_prefix("1"),
        CartLot::new("100", "556", 2).with_prefix("1"),
        CartLot::new("101", "777", 1).with_prefix("1"),
    ];
    std::fs::write(&input, pab_io::encode_cart(&cart)).unwrap();
    let names = pab_io::OutputNames::new(&input, None);

    let cache = MemoryCache::new();
    let mappings = FakeMappings::catalog();
    let statuses = FakeStatuses::default();
    let pipeline = Pipeline::new(
        &cache,
        filler(),
        Resolvers {
            mappings: &mappings,
            statuses: &statuses,
            lots: &FakeLots,
        },
    );

    let report = pipeline
        .save_money(&input, &names, &ReconcileConfig::new())
        .unwrap();

    // 500 > 450：改向原廠；400 <= 450：保留；777 無市集資訊：保留
    assert_eq!(report.arbitrage.estimated_savings, Decimal::from(300));
    assert_eq!(report.lot_fill.failed.len(), 1);
    assert_eq!(report.unpriced, vec![cart[2].clone()]);
    assert_eq!(report.retained, vec![cart[1].clone(), cart[2].clone()]);
    assert_eq!(
        read_allocations(&names.pab_order_json(1)),
        vec![Allocation::new("300121", 6)]
    );
    assert_eq!(
        pab_io::read_cart(names.retained_cart()).unwrap(),
        vec![cart[1].clone(), cart[2].clone()]
    );

    // 數量守恆
    let retained: u64 = report.retained.iter().map(|l| u64::from(l.quantity)).sum();
    assert_eq!(retained + report.arbitrage.migrated.total_quantity(), 9);
}

#[test]
fn test_merge_partslists() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.xml");
    let second = dir.path().join("b.xml");
    std::fs::write(&first, PARTSLIST).unwrap();
    std::fs::write(
        &second,
        "<INVENTORY><ITEM><ITEMID>3002</ITEMID><COLOR>1</COLOR><MINQTY>6</MINQTY></ITEM>\
         <ITEM><ITEMID>3005</ITEMID><COLOR>7</COLOR><MINQTY>1</MINQTY></ITEM></INVENTORY>",
    )
    .unwrap();
    let output = dir.path().join("merged.xml");

    let merged = pab::merge(&output, &[first, second], Condition::New).unwrap();

    assert_eq!(merged.len(), 6);
    assert_eq!(merged[1], Requirement::new("3002", 1, 10));
    assert_eq!(merged[5], Requirement::new("3005", 7, 1));

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("<CONDITION>N</CONDITION>"));
    assert_eq!(pab_io::read_partslist(&output).unwrap().requirements, merged);
}

#[test]
fn test_import_mappings_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("mappings.csv");
    std::fs::write(
        &csv,
        "design_id,color_id,element_id\n3001,5,300121\n3001,5,4211111\n3002,1,300201\n",
    )
    .unwrap();
    let cache = MemoryCache::new();

    assert_eq!(pab::import_mappings(&cache, &csv).unwrap(), (3, 0));
    assert_eq!(pab::import_mappings(&cache, &csv).unwrap(), (0, 3));
    assert_eq!(cache.mappings_for("3001", 5).unwrap().map(|rows| rows.len()), Some(2));

    let purged = pab::purge(
        &cache,
        pab::PurgeTables {
            mappings: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(purged, 3);
    assert_eq!(cache.lookup_mappings("3001").unwrap(), None);
}
