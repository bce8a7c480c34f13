// ==========================================
// BI 資料匯入工具 - 採購到貨進度
// ==========================================
// 來源: 採購狀況明細表.xlsx
// 唯一不整表取代的子系統: 逐列合併進 procure_items
// ==========================================

use crate::config::ImportConfig;
use crate::domain::frame::{CellValue, SourceFrame};
use crate::domain::procurement::ProcurementImportRow;
use crate::domain::types::Subsystem;
use crate::engine::subsystems::sources::load_single;
use crate::engine::subsystems::{open_store, ConversionReport, SubsystemConversion};
use crate::engine::upsert_engine::UpsertEngine;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::date_normalizer::{excel_serial_to_datetime, is_serial_in_range, parse_generic};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{ColumnRule, ColumnRules, FieldMapper};
use crate::importer::importer_trait::SheetSpec;
use crate::repository::PROCURE_TABLE;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, instrument};

pub const SOURCE_FILE: &str = "採購狀況明細表.xlsx";

const SERIAL_HEADER: &str = "序號";

// 交貨日期後的括號註記：2024/05/01(預計)、2024-05-01（待確認）
static ANNOTATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[（(][^)）]*[)）]").expect("valid annotation regex"));

/// 規則順序對應 ProcurementImportRow 欄位
pub fn column_rules() -> ColumnRules {
    ColumnRules::new(
        PROCURE_TABLE,
        vec![
            ColumnRule::new("單據編號"),
            ColumnRule::new(SERIAL_HEADER),
            ColumnRule::new("產品代碼"),
            ColumnRule::new("產品名稱"),
            ColumnRule::new("交易數量"),
            ColumnRule::new("倉庫確認數量"),
            ColumnRule::new("交貨日期"),
            ColumnRule::new("倉庫"),
            ColumnRule::new("狀態"),
        ],
    )
}

/// 交貨日期 → YYYY-MM-DD；無法解析則保留去除註記後的原文
pub fn format_delivery_date(cell: &CellValue) -> String {
    let parsed = match cell {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Number(n) if is_serial_in_range(*n) => excel_serial_to_datetime(*n),
        _ => None,
    };
    if let Some(dt) = parsed {
        return dt.format("%Y-%m-%d").to_string();
    }

    let text = DataCleaner.clean_cell(cell);
    let stripped = ANNOTATION_RE.replace_all(&text, "").trim().to_string();
    match parse_generic(&stripped) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => stripped,
    }
}

/// 來源資料框 → 匯入列
///
/// # 錯誤
/// - MissingColumn: 沒有序號欄
pub fn import_rows(frame: &SourceFrame) -> ImportResult<Vec<ProcurementImportRow>> {
    let resolved = FieldMapper.resolve(frame.headers(), &column_rules());
    if resolved[1].is_none() {
        return Err(ImportError::MissingColumn {
            table: PROCURE_TABLE.to_string(),
            column: SERIAL_HEADER.to_string(),
        });
    }

    let cleaner = DataCleaner;
    let empty = CellValue::Empty;
    let rows = (0..frame.len())
        .map(|r| {
            let cell = |field: usize| resolved[field].map(|c| frame.cell(r, c)).unwrap_or(&empty);
            ProcurementImportRow {
                row_number: r + 2,
                po_number: cleaner.clean_cell(cell(0)),
                item_serial_number: cleaner.clean_cell(cell(1)),
                product_code: cleaner.clean_cell(cell(2)),
                product_name: cleaner.clean_cell(cell(3)),
                quantity: cleaner.to_quantity(cell(4)),
                warehouse_qty: cleaner.to_quantity(cell(5)),
                delivery_date: format_delivery_date(cell(6)),
                warehouse: cleaner.clean_cell(cell(7)),
                status: cleaner.clean_cell(cell(8)),
            }
        })
        .collect();
    Ok(rows)
}

pub struct ProcurementConversion;

impl SubsystemConversion for ProcurementConversion {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Procurement
    }

    #[instrument(skip_all, name = "procurement")]
    fn convert(&self, config: &ImportConfig) -> ImportResult<ConversionReport> {
        let store = config.store_for(Subsystem::Procurement);
        let mut report = ConversionReport::new(Subsystem::Procurement, store);

        let source = load_single(config, SOURCE_FILE, &SheetSpec::first(), &mut report)?;
        let rows = import_rows(&source)?;
        info!(rows = rows.len(), "採購匯入列整理完成");

        let mut conn = open_store(store)?;
        let tally = UpsertEngine.run(&mut conn, &rows)?;
        report.upsert = Some(tally);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_format_delivery_date() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(format_delivery_date(&CellValue::DateTime(dt)), "2024-05-01");
        assert_eq!(format_delivery_date(&CellValue::Number(45413.0)), "2024-05-01");
        assert_eq!(format_delivery_date(&text("2024/05/01(預計)")), "2024-05-01");
        assert_eq!(format_delivery_date(&text("待確認（廠商）")), "待確認");
        assert_eq!(format_delivery_date(&CellValue::Empty), "");
    }

    #[test]
    fn test_import_rows_maps_columns() {
        let frame = SourceFrame::new(
            SOURCE_FILE,
            vec!["單據編號".into(), "序號".into(), "交易數量".into(), "狀態".into()],
            vec![vec![text(" PO1 "), CellValue::Number(1.0), text("10.0"), text("生產中")]],
        );
        let rows = import_rows(&frame).unwrap();
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].po_number, "PO1");
        assert_eq!(rows[0].item_serial_number, "1");
        assert_eq!(rows[0].quantity, 10);
        assert_eq!(rows[0].warehouse_qty, 0);
        assert_eq!(rows[0].status, "生產中");
    }

    #[test]
    fn test_missing_serial_column() {
        let frame = SourceFrame::new(SOURCE_FILE, vec!["單據編號".into()], vec![vec![text("PO1")]]);
        assert!(matches!(
            import_rows(&frame),
            Err(ImportError::MissingColumn { .. })
        ));
    }
}
