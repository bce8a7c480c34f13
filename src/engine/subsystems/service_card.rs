// ==========================================
// BI 資料匯入工具 - 服務登記卡
// ==========================================
// 來源: 服務登記卡.xlsx
// - 第 1 頁: 主檔（前兩列為標題），寬度 >= 18 欄時依位置命名
// - 第 2 頁: 耗材明細（一列或兩列表頭），失敗不影響主檔
// ==========================================

use crate::config::ImportConfig;
use crate::domain::frame::{CellValue, SourceFrame};
use crate::domain::types::Subsystem;
use crate::engine::subsystems::sources::load_single;
use crate::engine::subsystems::{open_store, write_table, ConversionReport, SubsystemConversion};
use crate::importer::date_normalizer::{
    excel_serial_to_datetime, is_serial_in_range, parse_generic, strip_weekday, DateNormalizer,
    DateVariant,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{ColumnRule, ColumnRules, FieldMapper};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::SheetSpec;
use crate::repository::{single_indexes, IndexSpec};
use rusqlite::Connection;
use tracing::{error, info, instrument};

pub const SOURCE_FILE: &str = "服務登記卡.xlsx";
pub const MAIN_TABLE: &str = "service_card_data";
pub const DETAIL_TABLE: &str = "service_card_detail";

/// 主檔依位置命名的欄位
pub const POSITIONAL_COLUMNS: [&str; 18] = [
    "服務登記號",
    "核算組織",
    "客戶代碼",
    "客戶名稱",
    "聯絡人",
    "聯絡電話",
    "服務地址",
    "產品型號",
    "產品序號",
    "服務項目",
    "服務人員",
    "登記日期",
    "服務日期",
    "完成日期",
    "服務狀態",
    "備註",
    "保固期限",
    "裝機位置說明",
];

pub const MAIN_DATE_COLUMNS: [&str; 4] = ["登記日期", "服務日期", "完成日期", "保固期限"];

pub const DETAIL_DATE_COLUMNS: [&str; 3] = ["上次更換", "上次通知", "下次通知"];

const CARD_NO: &str = "服務登記號";

pub fn detail_rules() -> ColumnRules {
    ColumnRules::new(
        DETAIL_TABLE,
        vec![
            ColumnRule::new(CARD_NO).alias("服務登記卡號").alias("登記號").alias("A登記號"),
            ColumnRule::new("物料代碼").alias("品號").alias("料號"),
            ColumnRule::new("產品名稱").alias("品名"),
            ColumnRule::new("標準售價").alias("售價").alias("單價"),
            ColumnRule::new("更換期限_月").alias("更換期限(月)").alias("更換期限"),
            ColumnRule::new("上次更換"),
            ColumnRule::new("上次通知"),
            ColumnRule::new("下次通知"),
            ColumnRule::new("數量").alias("Qty"),
        ],
    )
}

/// 明細日期: YYYY/MM/DD；無法解析則為空
pub fn format_detail_date(cell: &CellValue) -> CellValue {
    let parsed = match cell {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Number(n) if is_serial_in_range(*n) => excel_serial_to_datetime(*n),
        CellValue::Text(s) => parse_generic(&strip_weekday(s)),
        _ => None,
    };
    match parsed {
        Some(dt) => CellValue::Text(dt.format("%Y/%m/%d").to_string()),
        None => CellValue::Empty,
    }
}

pub struct ServiceCardConversion;

impl ServiceCardConversion {
    /// 主檔整理: 去空列、位置命名、日期
    pub fn prepare_main(&self, frame: &mut SourceFrame, report: &mut ConversionReport) -> bool {
        let dropped = frame.drop_empty_rows();
        info!(rows = frame.len(), dropped, "服務登記卡有效資料");

        let positional = frame.width() >= POSITIONAL_COLUMNS.len();
        if positional {
            for (i, name) in POSITIONAL_COLUMNS.iter().enumerate() {
                frame.rename_header(i, *name);
            }
        }

        let dates = DateNormalizer::new(DateVariant::Standard).normalize_frame(frame, &MAIN_DATE_COLUMNS);
        report.date_columns.extend(dates);
        positional
    }

    fn import_detail(
        &self,
        conn: &mut Connection,
        config: &ImportConfig,
        report: &mut ConversionReport,
    ) -> ImportResult<usize> {
        let sheet = SheetSpec::at(1).skip_rows(2).auto_header();
        let mut frame = UniversalFileParser.parse(config.source_path(SOURCE_FILE), &sheet)?;
        let dropped = frame.drop_empty_rows();

        let rules = detail_rules();
        let resolved = FieldMapper.resolve(frame.headers(), &rules);
        if resolved.first().copied().flatten().is_none() {
            return Err(ImportError::MissingColumn {
                table: DETAIL_TABLE.to_string(),
                column: CARD_NO.to_string(),
            });
        }

        for (rule, idx) in rules.rules.iter().zip(&resolved) {
            let Some(i) = *idx else { continue };
            if DETAIL_DATE_COLUMNS.contains(&rule.canonical.as_str()) {
                let values = frame.column(i).iter().map(format_detail_date).collect();
                frame.replace_column(i, values);
            }
        }

        let (detail, reconcile) = FieldMapper.reconcile(&frame, &rules);
        report.reconcile.push(reconcile);

        let indexes = vec![
            IndexSpec::single("idx_svc_detail_card_no", CARD_NO),
            IndexSpec::single("idx_svc_detail_product", "產品名稱"),
        ];
        write_table(conn, config, DETAIL_TABLE, &detail, true, &indexes, report)?;
        info!(rows = detail.len(), dropped, "服務登記卡明細匯入完成");
        Ok(detail.len())
    }
}

impl SubsystemConversion for ServiceCardConversion {
    fn subsystem(&self) -> Subsystem {
        Subsystem::ServiceCard
    }

    #[instrument(skip_all, name = "service_card")]
    fn convert(&self, config: &ImportConfig) -> ImportResult<ConversionReport> {
        let store = config.store_for(Subsystem::ServiceCard);
        let mut report = ConversionReport::new(Subsystem::ServiceCard, store);

        let mut source = load_single(config, SOURCE_FILE, &SheetSpec::first().skip_rows(2), &mut report)?;
        let positional = self.prepare_main(&mut source, &mut report);

        let mut rules = ColumnRules::new(MAIN_TABLE, Vec::new()).passthrough();
        if positional {
            rules = rules.remarks(&["備註"]);
        }
        let (main, reconcile) = FieldMapper.reconcile(&source, &rules);
        report.reconcile.push(reconcile);

        let mut conn = open_store(store)?;
        let indexes = single_indexes(&[
            ("idx_service_card_no", "服務登記號"),
            ("idx_service_card_customer", "客戶名稱"),
            ("idx_service_card_customer_code", "客戶代碼"),
            ("idx_service_card_address", "服務地址"),
            ("idx_service_card_phone", "聯絡電話"),
            ("idx_service_card_service", "服務項目"),
            ("idx_service_card_staff", "服務人員"),
            ("idx_service_card_reg_date", "登記日期"),
            ("idx_service_card_service_date", "服務日期"),
            ("idx_service_card_model", "產品型號"),
            ("idx_service_card_serial", "產品序號"),
        ]);
        write_table(&mut conn, config, MAIN_TABLE, &main, false, &indexes, &mut report)?;

        if let Err(e) = self.import_detail(&mut conn, config, &mut report) {
            error!(error = %e, "服務登記卡明細匯入失敗，已略過");
        }

        info!(rows = main.len(), "服務登記卡資料轉換完成");
        Ok(report)
    }
}
