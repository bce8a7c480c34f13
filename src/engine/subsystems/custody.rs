// ==========================================
// BI 資料匯入工具 - 寄倉主檔/明細
// ==========================================
// 來源: 寄倉資料.xlsx（標準日期）、昇峰寄庫資料.xlsx（斜線日期）
// 客戶名稱備援: 借貨對象名稱 → 寄貨對象名稱 → 客戶 → 客戶名稱
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
    SourceFile::standard("寄倉資料.xlsx"),
    SourceFile::slash_first("昇峰寄庫資料.xlsx"),
];

pub const DATE_COLUMNS: [&str; 1] = ["單據日期"];

pub const MAIN_COLUMNS: [&str; 8] = [
    "單據編號",
    "單據日期",
    "客戶代碼",
    "客戶名稱",
    "業務人員名稱",
    "聯絡電話",
    "送貨地址",
    "備註",
];

pub const DETAIL_COLUMNS: [&str; 3] = ["單據編號", "產品名稱", "交易數量"];

pub fn column_rules() -> ColumnRules {
    ColumnRules::new(
        "custody",
        vec![
            ColumnRule::new("單據編號"),
            ColumnRule::new("單據日期"),
            ColumnRule::new("客戶代碼").alias("借貨對象"),
            ColumnRule::matching("客戶名稱")
                .alias("借貨對象名稱")
                .alias("寄貨對象名稱")
                .fill_from("寄貨對象名稱")
                .fill_from("客戶")
                .fill_from("客戶名稱"),
            ColumnRule::new("業務人員名稱"),
            ColumnRule::new("聯絡電話"),
            ColumnRule::new("送貨地址"),
            ColumnRule::new("備註"),
            ColumnRule::new("產品名稱"),
            ColumnRule::new("交易數量").alias("倉庫確認數量"),
        ],
    )
    .remarks(&["備註"])
    .numeric("交易數量", NumericFallback::KeepText)
}

fn identity(columns: &[&'static str]) -> Vec<(&'static str, &'static str)> {
    columns.iter().map(|c| (*c, *c)).collect()
}

pub struct CustodyConversion;

impl SubsystemConversion for CustodyConversion {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Custody
    }

    #[instrument(skip_all, name = "custody")]
    fn convert(&self, config: &ImportConfig) -> ImportResult<ConversionReport> {
        let store = config.store_for(Subsystem::Custody);
        let mut report = ConversionReport::new(Subsystem::Custody, store);

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
            ("idx_custody_main_doc_no", "單據編號"),
            ("idx_custody_main_customer", "客戶名稱"),
            ("idx_custody_main_address", "送貨地址"),
            ("idx_custody_main_phone", "聯絡電話"),
            ("idx_custody_main_remark", "備註"),
        ]);
        write_table(&mut conn, config, "custody_main", &main, false, &main_indexes, &mut report)?;

        let detail_indexes = single_indexes(&[("idx_custody_detail_doc_no", "單據編號")]);
        write_table(&mut conn, config, "custody_detail", &detail, false, &detail_indexes, &mut report)?;

        info!(main = main.len(), detail = detail.len(), "寄倉資料轉換完成");
        Ok(report)
    }
}
