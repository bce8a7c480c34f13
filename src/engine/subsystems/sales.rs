// ==========================================
// BI 資料匯入工具 - 銷售主檔/明細
// ==========================================
// 來源: 發貨狀況分析表.xlsx（標準日期）、昇峰銷售資料.xlsx（斜線日期）
// 主檔: 每張單據一列（有客戶名稱者優先）
// 明細: 全部列
// ==========================================

use crate::config::ImportConfig;
use crate::domain::types::Subsystem;
use crate::engine::subsystems::sources::{load_sources, SourceFile};
use crate::engine::subsystems::{open_store, write_table, ConversionReport, SubsystemConversion};
use crate::importer::conflict_handler::ConflictHandler;
use crate::importer::data_cleaner::NumericFallback;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::{ColumnRule, ColumnRules, FieldMapper};
use crate::importer::importer_trait::SheetSpec;
use crate::repository::single_indexes;
use tracing::{info, instrument};

pub const SOURCES: [SourceFile; 2] = [
    SourceFile::standard("發貨狀況分析表.xlsx"),
    SourceFile::slash_first("昇峰銷售資料.xlsx"),
];

pub const DATE_COLUMNS: [&str; 2] = ["發貨日期", "單據日期"];

pub const MAIN_COLUMNS: [&str; 8] = [
    "單據編號",
    "發貨日期",
    "客戶名稱",
    "送貨地址",
    "聯絡電話",
    "備註",
    "業務人員名稱",
    "客戶代碼",
];

pub const DETAIL_COLUMNS: [&str; 5] = ["單據編號", "產品名稱", "交易數量", "交易價", "含稅金額"];

pub fn column_rules() -> ColumnRules {
    let mut rules: Vec<ColumnRule> = MAIN_COLUMNS
        .iter()
        .map(|c| {
            let rule = ColumnRule::new(*c);
            if *c == "客戶名稱" {
                rule.fill_from("客戶")
            } else {
                rule
            }
        })
        .collect();
    rules.extend(DETAIL_COLUMNS[1..].iter().map(|c| ColumnRule::new(*c)));

    ColumnRules::new("sales", rules)
        .remarks(&["備註"])
        .numeric("交易數量", NumericFallback::KeepText)
        .numeric("交易價", NumericFallback::KeepText)
        .numeric("含稅金額", NumericFallback::KeepText)
}

fn identity(columns: &[&'static str]) -> Vec<(&'static str, &'static str)> {
    columns.iter().map(|c| (*c, *c)).collect()
}

pub struct SalesConversion;

impl SubsystemConversion for SalesConversion {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Sales
    }

    #[instrument(skip_all, name = "sales")]
    fn convert(&self, config: &ImportConfig) -> ImportResult<ConversionReport> {
        let store = config.store_for(Subsystem::Sales);
        let mut report = ConversionReport::new(Subsystem::Sales, store);

        let frames = load_sources(config, &SOURCES, &SheetSpec::first(), &DATE_COLUMNS, &mut report)?;
        let (combined, reconcile) = FieldMapper.reconcile_all(&frames, &column_rules());
        report.reconcile.extend(reconcile);
        info!(rows = combined.len(), "合併後總筆數");

        let main = ConflictHandler.dedup_frame(
            combined.select(&identity(&MAIN_COLUMNS)),
            "單據編號",
            "客戶名稱",
        );
        let detail = combined.select(&identity(&DETAIL_COLUMNS));

        let mut conn = open_store(store)?;
        let main_indexes = single_indexes(&[
            ("idx_sales_main_doc_no", "單據編號"),
            ("idx_sales_main_customer", "客戶名稱"),
            ("idx_sales_main_address", "送貨地址"),
            ("idx_sales_main_phone", "聯絡電話"),
            ("idx_sales_main_remark", "備註"),
            ("idx_sales_main_customer_code", "客戶代碼"),
        ]);
        write_table(&mut conn, config, "sales_main", &main, false, &main_indexes, &mut report)?;

        let detail_indexes = single_indexes(&[("idx_sales_detail_doc_no", "單據編號")]);
        write_table(&mut conn, config, "sales_detail", &detail, false, &detail_indexes, &mut report)?;

        info!(main = main.len(), detail = detail.len(), "銷售資料轉換完成");
        Ok(report)
    }
}
