// ==========================================
// BI 資料匯入工具 - 正航庫存資料
// ==========================================
// 欄位以有序子字串規則表對應（第一條符合的規則勝出）
// 庫存屬性以設定檔對照表轉為顯示名稱
// ==========================================

use crate::config::ImportConfig;
use crate::domain::frame::{CanonicalFrame, FieldValue};
use crate::domain::types::Subsystem;
use crate::engine::subsystems::sources::load_single;
use crate::engine::subsystems::{open_store, write_table, ConversionReport, SubsystemConversion};
use crate::importer::data_cleaner::NumericFallback;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::{ColumnRule, ColumnRules, FieldMapper};
use crate::importer::importer_trait::SheetSpec;
use crate::repository::IndexSpec;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

pub const SOURCE_FILE: &str = "正航庫存資料.xlsx";
pub const TABLE: &str = "inventory_data";

/// 規則順序即優先順序
pub fn column_rules() -> ColumnRules {
    ColumnRules::new(
        TABLE,
        vec![
            ColumnRule::matching("product_name").contains("產品名稱"),
            ColumnRule::matching("warehouse_name").contains("倉庫名稱"),
            ColumnRule::matching("warehouse_partner_name")
                .contains("倉庫往來對象名稱")
                .contains("往來對象"),
            ColumnRule::matching("inventory_type")
                .contains("存貨屬性")
                .contains("庫存屬性")
                .alias("屬性"),
            ColumnRule::matching("product_code").contains("產品代碼").contains("代碼"),
            ColumnRule::matching("specification").contains("規格"),
            ColumnRule::matching("unit").contains("單位"),
            ColumnRule::matching("quantity").contains("數量"),
            ColumnRule::matching("unit_price").contains("單價"),
            ColumnRule::matching("total_amount").contains("總金額").contains("金額"),
            ColumnRule::matching("last_update_date").contains("更新日期").contains("日期"),
            ColumnRule::matching("remark").contains("備註"),
        ],
    )
    .first_rule_wins()
    .remarks(&["remark"])
    .numeric("quantity", NumericFallback::KeepText)
    .numeric("unit_price", NumericFallback::KeepText)
    .numeric("total_amount", NumericFallback::KeepText)
}

/// 庫存屬性 → 顯示名稱（完全相符才替換）
pub fn apply_attribute_labels(frame: &mut CanonicalFrame, labels: &BTreeMap<String, String>) {
    frame.map_column("inventory_type", |value| {
        let raw = value.as_text();
        let key = raw.trim();
        match labels.get(key) {
            Some(label) => FieldValue::text(label.clone()),
            None => FieldValue::text(key),
        }
    });
}

pub struct InventoryConversion;

impl SubsystemConversion for InventoryConversion {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Inventory
    }

    #[instrument(skip_all, name = "inventory")]
    fn convert(&self, config: &ImportConfig) -> ImportResult<ConversionReport> {
        let store = config.store_for(Subsystem::Inventory);
        let mut report = ConversionReport::new(Subsystem::Inventory, store);

        let source = load_single(config, SOURCE_FILE, &SheetSpec::first(), &mut report)?;
        debug!(headers = ?source.headers(), "庫存來源欄位");

        let (mut frame, reconcile) = FieldMapper.reconcile(&source, &column_rules());
        report.reconcile.push(reconcile);
        apply_attribute_labels(&mut frame, &config.inventory_attribute_labels);

        let mut conn = open_store(store)?;
        let indexes = vec![
            IndexSpec::single("idx_product_name", "product_name"),
            IndexSpec::single("idx_warehouse_name", "warehouse_name"),
            IndexSpec::single("idx_warehouse_partner_name", "warehouse_partner_name"),
            IndexSpec::single("idx_inventory_type", "inventory_type"),
            IndexSpec::single("idx_product_code", "product_code"),
            IndexSpec::single("idx_quantity", "quantity"),
            IndexSpec::compound("idx_product_warehouse", &["product_name", "warehouse_name"]),
            IndexSpec::compound("idx_warehouse_partner", &["warehouse_name", "warehouse_partner_name"]),
        ];
        write_table(&mut conn, config, TABLE, &frame, true, &indexes, &mut report)?;

        info!(rows = frame.len(), "正航庫存資料轉換完成");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use crate::domain::frame::{CellValue, SourceFrame};

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_rule_order_and_labels() {
        let source = SourceFrame::new(
            "正航庫存資料.xlsx",
            vec![
                "產品代碼".into(),
                "產品名稱".into(),
                "倉庫名稱".into(),
                "存貨屬性".into(),
                "庫存數量".into(),
                "總金額".into(),
            ],
            vec![vec![
                text("A-01"),
                text("冷氣"),
                text("台北倉"),
                text(" 借入庫存 "),
                text("1,200"),
                text("n/a"),
            ]],
        );
        let (mut frame, report) = FieldMapper.reconcile(&source, &column_rules());
        apply_attribute_labels(&mut frame, &ImportConfig::from_root("/tmp").inventory_attribute_labels);

        assert_eq!(frame.text(0, "product_code"), "A-01");
        assert_eq!(frame.text(0, "warehouse_name"), "台北倉");
        assert_eq!(frame.text(0, "inventory_type"), "寄倉");
        assert_eq!(frame.value(0, "quantity"), Some(&FieldValue::Real(1200.0)));
        assert_eq!(frame.value(0, "total_amount"), Some(&FieldValue::text("n/a")));
        assert!(report.gaps.contains(&"unit".to_string()));
    }

    #[test]
    fn test_unknown_attribute_kept() {
        let mut frame = CanonicalFrame::with_text_columns(&["inventory_type"]);
        frame.push_row(vec!["展示品".into()]);
        apply_attribute_labels(&mut frame, &BTreeMap::new());
        assert_eq!(frame.text(0, "inventory_type"), "展示品");
    }
}
