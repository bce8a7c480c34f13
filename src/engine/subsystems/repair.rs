// ==========================================
// BI 資料匯入工具 - 維修資料
// ==========================================
// 來源: 維修資料.xlsx、昇峰維修資料.xlsx（皆為標準日期）
// 保留全部來源欄；客戶代碼缺欄時由「客戶」帶入
// ==========================================

use crate::config::ImportConfig;
use crate::domain::types::Subsystem;
use crate::engine::subsystems::sources::{load_sources, SourceFile};
use crate::engine::subsystems::{open_store, write_table, ConversionReport, SubsystemConversion};
use crate::importer::conflict_handler::ConflictHandler;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::{ColumnRule, ColumnRules, FieldMapper};
use crate::importer::importer_trait::SheetSpec;
use crate::repository::single_indexes;
use tracing::{info, instrument};

pub const SOURCES: [SourceFile; 2] = [
    SourceFile::standard("維修資料.xlsx"),
    SourceFile::standard("昇峰維修資料.xlsx"),
];

pub const DATE_COLUMNS: [&str; 3] = ["出勤開始時間", "發貨日期", "單據日期"];

pub const TABLE: &str = "repair_data";

pub fn column_rules() -> ColumnRules {
    ColumnRules::new(
        TABLE,
        vec![
            ColumnRule::new("單據編號"),
            ColumnRule::new("客戶代碼").alias("客戶"),
            ColumnRule::new("客戶名稱").fill_from("客戶"),
        ],
    )
    .passthrough()
    .remarks(&["備註"])
}

pub struct RepairConversion;

impl SubsystemConversion for RepairConversion {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Repair
    }

    #[instrument(skip_all, name = "repair")]
    fn convert(&self, config: &ImportConfig) -> ImportResult<ConversionReport> {
        let store = config.store_for(Subsystem::Repair);
        let mut report = ConversionReport::new(Subsystem::Repair, store);

        let frames = load_sources(config, &SOURCES, &SheetSpec::first(), &DATE_COLUMNS, &mut report)?;
        let (combined, reconcile) = FieldMapper.reconcile_all(&frames, &column_rules());
        report.reconcile.extend(reconcile);

        let deduped = ConflictHandler.dedup_frame(combined, "單據編號", "客戶名稱");

        let mut conn = open_store(store)?;
        let indexes = single_indexes(&[
            ("idx_repair_doc_no", "單據編號"),
            ("idx_repair_customer", "客戶名稱"),
            ("idx_repair_address", "服務地址"),
            ("idx_repair_phone", "聯絡電話"),
            ("idx_repair_remark", "備註"),
            ("idx_repair_customer_code", "客戶代碼"),
        ]);
        write_table(&mut conn, config, TABLE, &deduped, false, &indexes, &mut report)?;

        info!(rows = deduped.len(), "維修資料轉換完成");
        Ok(report)
    }
}
