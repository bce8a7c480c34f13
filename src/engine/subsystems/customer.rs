// ==========================================
// BI 資料匯入工具 - 客戶主檔
// ==========================================
// 來源: 客戶資料.xlsx（表頭常為 "Unnamed: N" 佔位名）
// 輸出: customer_new.db（每次刪檔重建）
// ==========================================

use crate::config::ImportConfig;
use crate::domain::types::Subsystem;
use crate::engine::subsystems::sources::load_single;
use crate::engine::subsystems::{open_store, write_table, ConversionReport, SubsystemConversion};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::{ColumnRule, ColumnRules, FieldMapper};
use crate::importer::importer_trait::SheetSpec;
use crate::repository::schema::create_customer_side_tables;
use crate::repository::single_indexes;
use tracing::{info, instrument};

pub const SOURCE_FILE: &str = "客戶資料.xlsx";
pub const TABLE: &str = "customer_basic";

/// 非資料列的代碼值（標題列、重複表頭）
const BANNER_CODES: [&str; 3] = ["", "客戶資料", "代碼"];

pub fn column_rules() -> ColumnRules {
    let rule = |name: &str, position: usize| {
        ColumnRule::new(name).alias(crate::domain::frame::placeholder_header(position))
    };
    ColumnRules::new(
        TABLE,
        vec![
            rule("客戶代碼", 0),
            rule("客戶名稱", 3),
            rule("聯絡地址", 2),
            rule("郵遞區號", 1),
            rule("聯絡電話", 10),
            rule("聯絡人", 9),
            rule("業務人員名稱", 4),
            rule("銷售分類碼名稱", 5),
            rule("預設銷售通路名稱", 6),
            rule("正航舊編碼", 7),
            rule("舊編碼", 8),
        ],
    )
}

pub struct CustomerConversion;

impl SubsystemConversion for CustomerConversion {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Customer
    }

    #[instrument(skip_all, name = "customer")]
    fn convert(&self, config: &ImportConfig) -> ImportResult<ConversionReport> {
        let store = config.store_for(Subsystem::Customer);
        let mut report = ConversionReport::new(Subsystem::Customer, store);

        let source = load_single(config, SOURCE_FILE, &SheetSpec::first(), &mut report)?;

        let (mut frame, reconcile) = FieldMapper.reconcile(&source, &column_rules());
        report.reconcile.push(reconcile);

        let before = frame.len();
        let code_idx = frame.column_index("客戶代碼");
        frame.retain_rows(|_, row| {
            code_idx
                .map(|i| !BANNER_CODES.contains(&row[i].as_text().as_str()))
                .unwrap_or(false)
        });
        info!(before, after = frame.len(), "過濾非資料列");

        // 來源檔存在才刪除舊庫
        if store.exists() {
            std::fs::remove_file(store)?;
        }
        let mut conn = open_store(store)?;

        let indexes = single_indexes(&[
            ("idx_customer_name", "客戶名稱"),
            ("idx_customer_code", "客戶代碼"),
            ("idx_customer_phone", "聯絡電話"),
            ("idx_customer_address", "聯絡地址"),
        ]);
        write_table(&mut conn, config, TABLE, &frame, false, &indexes, &mut report)?;
        create_customer_side_tables(&conn)?;

        info!(rows = frame.len(), "客戶資料轉換完成");
        Ok(report)
    }
}
