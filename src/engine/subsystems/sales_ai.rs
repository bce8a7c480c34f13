// ==========================================
// BI 資料匯入工具 - AI 查詢用銷售資料
// ==========================================
// 與銷售主檔同來源，但保留全部欄位與全部列（不去重）
// 數值欄無法解析時寫入 0
// ==========================================

use crate::config::ImportConfig;
use crate::domain::frame::CanonicalFrame;
use crate::domain::types::Subsystem;
use crate::engine::subsystems::sales::SOURCES;
use crate::engine::subsystems::sources::load_sources;
use crate::engine::subsystems::{open_store, write_table, ConversionReport, SubsystemConversion};
use crate::importer::data_cleaner::NumericFallback;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::{ColumnRule, ColumnRules, FieldMapper};
use crate::importer::importer_trait::SheetSpec;
use crate::repository::single_indexes;
use tracing::{debug, info, instrument};

pub const TABLE: &str = "sales_data";

pub const DATE_COLUMNS: [&str; 4] = ["發貨日期", "單據日期", "建立日期", "過帳日期"];

pub const NUMERIC_COLUMNS: [&str; 3] = ["交易數量", "倉庫確認數量", "交易價"];

pub fn column_rules() -> ColumnRules {
    let mut rules = ColumnRules::new(TABLE, vec![ColumnRule::new("客戶名稱").fill_from("客戶")]).passthrough();
    for column in NUMERIC_COLUMNS {
        rules = rules.numeric(column, NumericFallback::Zero);
    }
    rules
}

/// 移除已併入客戶名稱的「客戶」欄與佔位欄
pub fn drop_redundant_columns(frame: &mut CanonicalFrame) -> Vec<String> {
    frame.drop_columns(|name| name == "客戶" || name.contains("Unnamed"))
}

pub struct SalesAiConversion;

impl SubsystemConversion for SalesAiConversion {
    fn subsystem(&self) -> Subsystem {
        Subsystem::SalesAi
    }

    #[instrument(skip_all, name = "sales_ai")]
    fn convert(&self, config: &ImportConfig) -> ImportResult<ConversionReport> {
        let store = config.store_for(Subsystem::SalesAi);
        let mut report = ConversionReport::new(Subsystem::SalesAi, store);

        let frames = load_sources(config, &SOURCES, &SheetSpec::first(), &DATE_COLUMNS, &mut report)?;
        let (mut combined, reconcile) = FieldMapper.reconcile_all(&frames, &column_rules());
        report.reconcile.extend(reconcile);

        let dropped = drop_redundant_columns(&mut combined);
        debug!(dropped = ?dropped, "移除多餘欄位");

        let mut conn = open_store(store)?;
        let indexes = single_indexes(&[
            ("idx_sales_ai_doc_no", "單據編號"),
            ("idx_sales_ai_date", "發貨日期"),
            ("idx_sales_ai_customer", "客戶名稱"),
            ("idx_sales_ai_product", "產品名稱"),
            ("idx_sales_ai_salesperson", "業務人員名稱"),
            ("idx_sales_ai_customer_code", "客戶代碼"),
        ]);
        write_table(&mut conn, config, TABLE, &combined, false, &indexes, &mut report)?;

        info!(rows = combined.len(), columns = combined.columns().len(), "AI 銷售資料轉換完成");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::{placeholder_header, CellValue, FieldValue, SourceFrame};

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_customer_merge_and_numeric_zero() {
        let source = SourceFrame::new(
            "發貨狀況分析表.xlsx",
            vec![
                "單據編號".into(),
                "客戶".into(),
                "交易數量".into(),
                "交易價".into(),
                placeholder_header(4),
            ],
            vec![
                vec![text("S1"), text("甲公司"), text("3"), text("-"), CellValue::Empty],
                vec![text("S1"), text("甲公司"), CellValue::Number(2.0), text("100"), CellValue::Empty],
            ],
        );
        let (mut frame, _) = FieldMapper.reconcile(&source, &column_rules());
        let dropped = drop_redundant_columns(&mut frame);

        assert_eq!(dropped, vec!["客戶".to_string(), "Unnamed: 4".to_string()]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.text(0, "客戶名稱"), "甲公司");
        assert_eq!(frame.value(0, "交易價"), Some(&FieldValue::Real(0.0)));
        assert_eq!(frame.value(1, "交易數量"), Some(&FieldValue::Real(2.0)));
        assert!(!frame.has_column("倉庫確認數量"));
    }
}
