use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pab::{ConsoleDecisionSource, Pipeline, PurgeTables, Resolvers};
use pab_cache::{CacheFiller, FillConfig, SqliteCache};
use pab_calc::DecisionSource;
use pab_core::{Condition, ReconcileConfig, TieBreakPolicy};
use pab_fetch::{MappingTable, PickABrickClient, StoreLotClient};
use pab_io::OutputNames;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(
    name = "pab",
    version,
    about = "將市集零件清單轉為原廠訂單，並比對購物車價格。"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 零件清單（XML）轉為原廠訂單
    Convert(RunArgs),
    /// 購物車中原廠較便宜的批次改向原廠
    SaveMoney(RunArgs),
    /// 合併多份零件清單
    Merge(MergeArgs),
    /// 清空快取表
    Purge(PurgeArgs),
    /// 由 CSV 對照表匯入設計/元件對應
    ImportMappings(ImportArgs),
}

#[derive(Debug, Args)]
struct CacheArgs {
    /// 快取資料庫
    #[arg(long, default_value = "part_info.db", env = "PAB_DB")]
    db: PathBuf,

    /// 日誌檔（同時輸出至 stderr）
    #[arg(short = 'l', long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// 輸入檔（convert: .xml，save-money: .cart）
    input: PathBuf,

    /// 輸出目錄（預設與輸入檔相同）
    #[arg(short = 'o', long)]
    out_dir: Option<PathBuf>,

    #[command(flatten)]
    cache: CacheArgs,

    /// 成色旗標: new | used | any
    #[arg(long)]
    condition: Option<Condition>,

    /// 同價決勝規則: primary | secondary | larger-group | larger-quantity | interactive
    #[arg(long)]
    tie_break: Option<TieBreakPolicy>,

    /// 單張訂單最大批數
    #[arg(long)]
    max_lots: Option<usize>,

    /// 查詢並行數
    #[arg(long, default_value_t = 8)]
    workers: usize,

    /// JSON 配置檔（命令列參數優先）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 設計/元件 CSV 對照表
    #[arg(long)]
    mappings: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct MergeArgs {
    /// 輸出檔（.xml）
    output: PathBuf,

    /// 輸入檔（.xml）
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// 成色旗標: new | used | any
    #[arg(long, default_value = "any")]
    condition: Condition,

    /// 日誌檔
    #[arg(short = 'l', long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct PurgeArgs {
    #[command(flatten)]
    cache: CacheArgs,

    /// 清空設計/元件對應
    #[arg(long, default_value_t = false)]
    mappings: bool,

    /// 清空販售狀態
    #[arg(long, default_value_t = false)]
    statuses: bool,

    /// 清空市集批次
    #[arg(long, default_value_t = false)]
    lots: bool,
}

#[derive(Debug, Args)]
struct ImportArgs {
    /// CSV 檔（design_id,color_id,element_id）
    file: PathBuf,

    #[command(flatten)]
    cache: CacheArgs,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = match &cli.cmd {
        Command::Convert(args) | Command::SaveMoney(args) => args.cache.log_file.as_deref(),
        Command::Merge(args) => args.log_file.as_deref(),
        Command::Purge(args) => args.cache.log_file.as_deref(),
        Command::ImportMappings(args) => args.cache.log_file.as_deref(),
    };
    pab::logging::init(log_file).context("無法開啟日誌檔")?;

    match cli.cmd {
        Command::Convert(args) => cmd_convert(args),
        Command::SaveMoney(args) => cmd_save_money(args),
        Command::Merge(args) => cmd_merge(args),
        Command::Purge(args) => cmd_purge(args),
        Command::ImportMappings(args) => cmd_import(args),
    }
}

fn cmd_convert(args: RunArgs) -> anyhow::Result<()> {
    pab_io::require_extension(&args.input, "xml")?;
    let config = run_config(&args)?;
    let names = OutputNames::new(&args.input, args.out_dir.as_deref());

    let cache = open_cache(&args.cache.db)?;
    let table = mapping_table(args.mappings.as_deref())?;
    let statuses = PickABrickClient::new()?;
    let lots = StoreLotClient::new()?;
    let filler = CacheFiller::new(FillConfig::default().with_workers(args.workers))?;
    let pipeline = Pipeline::new(
        &cache,
        filler,
        Resolvers {
            mappings: &table,
            statuses: &statuses,
            lots: &lots,
        },
    );

    let mut console = ConsoleDecisionSource::stdio();
    let source: Option<&mut dyn DecisionSource> = match config.tie_break {
        Some(TieBreakPolicy::Interactive) => Some(&mut console as &mut dyn DecisionSource),
        _ => None,
    };

    let report = pipeline.convert(&args.input, &names, &config, source)?;
    info!("{}", report.describe());
    for path in &report.written {
        info!("已寫出 {}", path.display());
    }
    Ok(())
}

fn cmd_save_money(args: RunArgs) -> anyhow::Result<()> {
    pab_io::require_extension(&args.input, "cart")?;
    let config = run_config(&args)?;
    let names = OutputNames::new(&args.input, args.out_dir.as_deref());

    let cache = open_cache(&args.cache.db)?;
    let table = mapping_table(args.mappings.as_deref())?;
    let statuses = PickABrickClient::new()?;
    let lots = StoreLotClient::new()?;
    let filler = CacheFiller::new(FillConfig::default().with_workers(args.workers))?;
    let pipeline = Pipeline::new(
        &cache,
        filler,
        Resolvers {
            mappings: &table,
            statuses: &statuses,
            lots: &lots,
        },
    );

    let report = pipeline.save_money(&args.input, &names, &config)?;
    info!(
        "完成：保留 {} 批，{} 個警告",
        report.retained.len(),
        report.arbitrage.warnings.len()
    );
    for path in &report.written {
        info!("已寫出 {}", path.display());
    }
    Ok(())
}

fn cmd_merge(args: MergeArgs) -> anyhow::Result<()> {
    let merged = pab::merge(&args.output, &args.inputs, args.condition)?;
    info!("已合併 {} 筆至 {}", merged.len(), args.output.display());
    Ok(())
}

fn cmd_purge(args: PurgeArgs) -> anyhow::Result<()> {
    let cache = open_cache(&args.cache.db)?;
    let deleted = pab::purge(
        &cache,
        PurgeTables {
            mappings: args.mappings,
            statuses: args.statuses,
            lots: args.lots,
        },
    )?;
    info!("已刪除 {} 列", deleted);
    Ok(())
}

fn cmd_import(args: ImportArgs) -> anyhow::Result<()> {
    let cache = open_cache(&args.cache.db)?;
    pab::import_mappings(&cache, &args.file)?;
    Ok(())
}

/// 配置檔與命令列參數合併（命令列優先）
fn run_config(args: &RunArgs) -> anyhow::Result<ReconcileConfig> {
    let mut config = match &args.config {
        Some(path) => pab::load_config(path)?,
        None => ReconcileConfig::default(),
    };
    if let Some(condition) = args.condition {
        config = config.with_condition(condition);
    }
    if let Some(policy) = args.tie_break {
        config = config.with_tie_break(policy);
    }
    if let Some(max_lots) = args.max_lots {
        config = config.with_max_lots(max_lots);
    }
    config.validate()?;
    Ok(config)
}

fn open_cache(path: &Path) -> anyhow::Result<SqliteCache> {
    SqliteCache::open(path).with_context(|| format!("無法開啟快取 {}", path.display()))
}

fn mapping_table(path: Option<&Path>) -> anyhow::Result<MappingTable> {
    match path {
        Some(path) => MappingTable::from_path(path)
            .with_context(|| format!("無法讀取對照表 {}", path.display())),
        None => {
            info!("未指定對照表，僅使用快取中的對應");
            Ok(MappingTable::default())
        }
    }
}
