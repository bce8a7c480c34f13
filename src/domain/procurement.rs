// ==========================================
// BI 資料匯入工具 - 採購到貨進度領域模型
// ==========================================
// 唯一鍵: (po_number, item_serial_number)
// 權威欄位: 每次匯入以最新來源覆寫
// 作業欄位: 僅由下游人員維護，匯入永不覆寫
// ==========================================

use serde::{Deserialize, Serialize};

/// 權威欄位（順序即 UPDATE 的 SET 順序）
pub const AUTHORITATIVE_COLUMNS: [&str; 7] = [
    "product_code",
    "product_name",
    "quantity",
    "warehouse_qty",
    "delivery_date",
    "warehouse",
    "status",
];

/// 作業欄位（新增時為空字串，之後匯入不再觸碰）
pub const OPERATOR_COLUMNS: [&str; 5] = [
    "dispatch_date",
    "arrival_date",
    "ship_info",
    "goods_status",
    "remarks",
];

/// 整數型別的權威欄位
pub const INTEGER_COLUMNS: [&str; 2] = ["quantity", "warehouse_qty"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcurementKey {
    pub po_number: String,
    pub item_serial_number: String,
}

/// 一列採購匯入資料（已完成清理）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcurementImportRow {
    /// 來源試算表列號（含表頭，1 起算）
    pub row_number: usize,
    pub po_number: String,
    pub item_serial_number: String,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub warehouse_qty: i64,
    pub delivery_date: String,
    pub warehouse: String,
    pub status: String,
}

impl ProcurementImportRow {
    /// 單號或序號為空時回傳 None
    pub fn key(&self) -> Option<ProcurementKey> {
        if self.po_number.trim().is_empty() || self.item_serial_number.trim().is_empty() {
            return None;
        }
        Some(ProcurementKey {
            po_number: self.po_number.clone(),
            item_serial_number: self.item_serial_number.clone(),
        })
    }
}

/// 資料庫中的採購項目（讀取模型）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementItem {
    pub id: i64,
    pub po_number: String,
    pub item_serial_number: String,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub warehouse_qty: i64,
    pub delivery_date: String,
    pub warehouse: String,
    pub status: String,
    pub dispatch_date: String,
    pub arrival_date: String,
    pub ship_info: String,
    pub goods_status: String,
    pub remarks: String,
}

/// 唯一鍵查詢結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Missing,
    Present(i64),
    Malformed,
}

/// 單列處理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Skipped,
    Errored(String),
}

/// 匯入統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertTally {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl UpsertTally {
    pub fn record(&mut self, outcome: &UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Skipped => self.skipped += 1,
            UpsertOutcome::Errored(_) => self.errored += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.skipped + self.errored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(po: &str, serial: &str) -> ProcurementImportRow {
        ProcurementImportRow {
            row_number: 2,
            po_number: po.to_string(),
            item_serial_number: serial.to_string(),
            product_code: String::new(),
            product_name: String::new(),
            quantity: 0,
            warehouse_qty: 0,
            delivery_date: String::new(),
            warehouse: String::new(),
            status: String::new(),
        }
    }

    #[test]
    fn test_key_requires_both_parts() {
        assert!(row("PO1", "1").key().is_some());
        assert!(row("", "1").key().is_none());
        assert!(row("PO1", "  ").key().is_none());
    }

    #[test]
    fn test_column_sets_are_disjoint() {
        for col in OPERATOR_COLUMNS {
            assert!(!AUTHORITATIVE_COLUMNS.contains(&col));
        }
    }

    #[test]
    fn test_tally_record() {
        let mut tally = UpsertTally::default();
        tally.record(&UpsertOutcome::Inserted);
        tally.record(&UpsertOutcome::Updated);
        tally.record(&UpsertOutcome::Errored("x".into()));
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.errored, 1);
    }
}
