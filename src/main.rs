// ==========================================
// BI 資料匯入工具 - 命令列主入口
// ==========================================
// 無參數: 互動選單
// --daily / --run <模式>: 直接執行，不詢問
// 結束碼一律為 0（部分失敗與全部失敗不區分）
// ==========================================

use anyhow::Context;
use bi_data_import::config::{ImportConfig, ROOT_ENV};
use bi_data_import::domain::types::{RunMode, Subsystem};
use bi_data_import::engine::{Orchestrator, RunSummary, VerifyLine};
use bi_data_import::i18n::{self, t, t_with_args};
use bi_data_import::logging;
use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use std::path::PathBuf;

/// BI 系統整合資料匯入工具
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// 每日更新模式（不詢問）
    #[arg(long, conflicts_with = "run")]
    daily: bool,

    /// 直接執行指定模式: full, daily, sales_only, inventory_only, verify 或子系統代碼
    #[arg(long, value_name = "MODE")]
    run: Option<RunMode>,

    /// 資料根目錄
    #[arg(long, env = ROOT_ENV, default_value = ".")]
    root: PathBuf,

    /// 設定檔路徑（預設 <root>/bi-import.toml）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 介面語言: zh-TW, en
    #[arg(long, default_value = i18n::DEFAULT_LOCALE)]
    lang: String,

    /// 每批寫入筆數
    #[arg(long)]
    chunk_size: Option<usize>,

    /// 將執行結果寫成 JSON
    #[arg(long, value_name = "PATH")]
    summary_json: Option<PathBuf>,

    /// 以 JSON 格式輸出日誌
    #[arg(long)]
    json_log: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.json_log {
        logging::init_json();
    } else {
        logging::init();
    }
    if !i18n::set_locale(&cli.lang) {
        tracing::warn!(lang = %cli.lang, "不支援的語言，改用預設");
    }

    if let Err(e) = run(cli) {
        eprintln!("\n{}", t_with_args("common.failed", &[("error", &format!("{:#}", e))]));
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ImportConfig::load(cli.root.clone(), cli.config.as_deref()).context("載入設定失敗")?;
    if let Some(size) = cli.chunk_size {
        config = config.with_chunk_size(size)?;
    }

    let mode = if cli.daily { Some(RunMode::Daily) } else { cli.run };
    let mode = match mode {
        Some(mode) => mode,
        None => match prompt_mode(&config)? {
            Some(mode) => mode,
            None => return Ok(()),
        },
    };

    let summary = Orchestrator::new(config).run(mode);
    print_summary(&summary);

    if let Some(path) = cli.summary_json {
        let json = summary.to_json()?;
        std::fs::write(&path, json).with_context(|| format!("寫入 {} 失敗", path.display()))?;
    }
    Ok(())
}

/// 選單項目（順序即編號）
fn menu_items() -> Vec<(&'static str, RunMode)> {
    vec![
        ("menu.full", RunMode::Full),
        ("menu.daily", RunMode::Daily),
        ("menu.sales_only", RunMode::SalesOnly),
        ("menu.inventory_only", RunMode::InventoryOnly),
        ("menu.customer", RunMode::Single(Subsystem::Customer)),
        ("menu.sales", RunMode::Single(Subsystem::Sales)),
        ("menu.repair", RunMode::Single(Subsystem::Repair)),
        ("menu.custody", RunMode::Single(Subsystem::Custody)),
        ("menu.service_card", RunMode::Single(Subsystem::ServiceCard)),
        ("menu.crm_notes", RunMode::Single(Subsystem::CrmNotes)),
        ("menu.procurement", RunMode::Single(Subsystem::Procurement)),
        ("menu.verify", RunMode::Verify),
        ("menu.sales_ai", RunMode::Single(Subsystem::SalesAi)),
    ]
}

/// 互動選單；選擇離開或按 Esc 時回傳 None
fn prompt_mode(config: &ImportConfig) -> anyhow::Result<Option<RunMode>> {
    let items = menu_items();
    let mut labels: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, (key, _))| format!("{:>2}. {}", i + 1, t(key)))
        .collect();
    labels.push(format!(" Q. {}", t("menu.quit")));

    println!("{}", "=".repeat(60));
    println!("{}", t("common.app_name"));
    println!(
        "{}",
        t_with_args("common.source_dir", &[("path", &config.source_dir.display().to_string())])
    );
    println!("{}", "=".repeat(60));

    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t("menu.title"))
        .items(&labels)
        .default(0)
        .interact_opt()?;

    Ok(choice.and_then(|i| items.get(i).map(|(_, mode)| *mode)))
}

fn print_summary(summary: &RunSummary) {
    println!("\n{}", "=".repeat(60));
    for result in &summary.results {
        let label = t(&result.subsystem.label_key());
        match (&result.report, &result.error) {
            (_, Some(error)) => println!(
                "  ✗ {}",
                t_with_args("common.subsystem_failed", &[("label", &label), ("error", error)])
            ),
            (Some(report), None) => println!(
                "  ✓ {}",
                t_with_args(
                    "common.subsystem_ok",
                    &[("label", &label), ("rows", &report.rows_written().to_string())]
                )
            ),
            (None, None) => {}
        }
    }

    if let Some(verification) = &summary.verification {
        println!("\n{}", t("verify.title"));
        let mut group = None;
        for entry in &verification.entries {
            if group != Some(entry.group) {
                println!("  {}", t(entry.group.label_key()));
                group = Some(entry.group);
            }
            let label = t(&entry.label_key);
            let line = match &entry.line {
                VerifyLine::Count(n) => {
                    t_with_args("verify.rows", &[("label", &label), ("count", &n.to_string())])
                }
                VerifyLine::MissingStore => t_with_args(
                    "verify.missing_store",
                    &[("label", &label), ("path", &entry.store.display().to_string())],
                ),
                VerifyLine::MissingTable => t_with_args("verify.missing_table", &[("label", &label)]),
                VerifyLine::Failed(e) => t_with_args("verify.failed", &[("label", &label), ("error", e)]),
            };
            println!("    {}", line);
        }
    }

    println!("\n{}", t_with_args("common.elapsed", &[("elapsed", &summary.elapsed)]));
    println!("{}", t("common.done"));
}
