// ==========================================
// BI 資料匯入工具 - 採購到貨進度倉儲
// ==========================================
// 資料表: procure_items
// 紅線: UPDATE 只寫權威欄位；作業欄位僅在 INSERT 時以空字串初始化
// ==========================================

use crate::db::{quote_ident, table_columns};
use crate::domain::procurement::{
    ProcurementImportRow, ProcurementItem, AUTHORITATIVE_COLUMNS, INTEGER_COLUMNS,
    OPERATOR_COLUMNS,
};
use crate::importer::error::{ImportError, ImportResult};
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

pub const PROCURE_TABLE: &str = "procure_items";

const CREATE_PROCURE_ITEMS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS procure_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    po_number TEXT NOT NULL,
    item_serial_number TEXT NOT NULL,
    product_code TEXT,
    product_name TEXT,
    quantity INTEGER,
    warehouse_qty INTEGER,
    delivery_date TEXT,
    dispatch_date TEXT,
    warehouse TEXT,
    arrival_date TEXT,
    ship_info TEXT,
    status TEXT,
    goods_status TEXT,
    remarks TEXT,
    UNIQUE(po_number, item_serial_number)
)
"#;

/// 權威欄位 UPDATE 語句（依 AUTHORITATIVE_COLUMNS 產生）
pub static UPDATE_AUTHORITATIVE_SQL: Lazy<String> = Lazy::new(|| {
    let sets = AUTHORITATIVE_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{} = ?{}", col, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE procure_items SET {} WHERE id = ?{}",
        sets,
        AUTHORITATIVE_COLUMNS.len() + 1
    )
});

const INSERT_ITEM_SQL: &str = r#"
INSERT INTO procure_items (
    po_number, item_serial_number, product_code, product_name,
    quantity, warehouse_qty, delivery_date, warehouse, status,
    dispatch_date, arrival_date, ship_info, goods_status, remarks
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, '', '', '', '', '')
"#;

pub struct ProcurementRepository;

impl ProcurementRepository {
    /// 建表並補齊舊資料庫缺少的欄位，回傳新增的欄位
    pub fn ensure_schema(conn: &Connection) -> ImportResult<Vec<String>> {
        conn.execute_batch(CREATE_PROCURE_ITEMS_SQL)?;

        let existing = table_columns(conn, PROCURE_TABLE)?;
        let expected = ["po_number", "item_serial_number"]
            .into_iter()
            .chain(AUTHORITATIVE_COLUMNS)
            .chain(OPERATOR_COLUMNS);

        let mut added = Vec::new();
        for column in expected {
            if existing.iter().any(|c| c == column) {
                continue;
            }
            let sql_type = if INTEGER_COLUMNS.contains(&column) {
                "INTEGER"
            } else {
                "TEXT"
            };
            conn.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                PROCURE_TABLE,
                quote_ident(column),
                sql_type
            ))?;
            added.push(column.to_string());
        }

        if !added.is_empty() {
            info!(table = PROCURE_TABLE, columns = ?added, "已補齊缺少的欄位");
        }
        Ok(added)
    }

    /// 依唯一鍵查詢 id
    pub fn find_key(
        conn: &Connection,
        po_number: &str,
        item_serial_number: &str,
    ) -> rusqlite::Result<Option<i64>> {
        conn.query_row(
            "SELECT id FROM procure_items WHERE po_number = ?1 AND item_serial_number = ?2",
            params![po_number, item_serial_number],
            |row| row.get(0),
        )
        .optional()
    }

    /// 新增一筆（作業欄位初始化為空字串），回傳新 id
    pub fn insert_item(conn: &Connection, row: &ProcurementImportRow) -> rusqlite::Result<i64> {
        let mut stmt = conn.prepare_cached(INSERT_ITEM_SQL)?;
        stmt.execute(params![
            row.po_number,
            row.item_serial_number,
            row.product_code,
            row.product_name,
            row.quantity,
            row.warehouse_qty,
            row.delivery_date,
            row.warehouse,
            row.status,
        ])?;
        Ok(conn.last_insert_rowid())
    }

    /// 只覆寫權威欄位
    pub fn update_authoritative(
        conn: &Connection,
        id: i64,
        row: &ProcurementImportRow,
    ) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(UPDATE_AUTHORITATIVE_SQL.as_str())?;
        stmt.execute(params![
            row.product_code,
            row.product_name,
            row.quantity,
            row.warehouse_qty,
            row.delivery_date,
            row.warehouse,
            row.status,
            id,
        ])
    }

    /// 作業人員維護作業欄位（下游系統的寫入路徑）
    pub fn set_operator_field(
        conn: &Connection,
        po_number: &str,
        item_serial_number: &str,
        column: &str,
        value: &str,
    ) -> ImportResult<usize> {
        if !OPERATOR_COLUMNS.contains(&column) {
            return Err(ImportError::InternalError(format!(
                "{} 不是作業欄位",
                column
            )));
        }
        let sql = format!(
            "UPDATE procure_items SET {} = ?1 WHERE po_number = ?2 AND item_serial_number = ?3",
            quote_ident(column)
        );
        Ok(conn.execute(&sql, params![value, po_number, item_serial_number])?)
    }

    /// 讀取全部項目（依 id 排序）
    pub fn list_items(conn: &Connection) -> ImportResult<Vec<ProcurementItem>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, po_number, item_serial_number, product_code, product_name,
                   quantity, warehouse_qty, delivery_date, warehouse, status,
                   dispatch_date, arrival_date, ship_info, goods_status, remarks
            FROM procure_items
            ORDER BY id
            "#,
        )?;

        let text = |row: &rusqlite::Row, idx: usize| -> rusqlite::Result<String> {
            Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
        };

        let items = stmt
            .query_map([], |row| {
                Ok(ProcurementItem {
                    id: row.get(0)?,
                    po_number: text(row, 1)?,
                    item_serial_number: text(row, 2)?,
                    product_code: text(row, 3)?,
                    product_name: text(row, 4)?,
                    quantity: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                    warehouse_qty: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
                    delivery_date: text(row, 7)?,
                    warehouse: text(row, 8)?,
                    status: text(row, 9)?,
                    dispatch_date: text(row, 10)?,
                    arrival_date: text(row, 11)?,
                    ship_info: text(row, 12)?,
                    goods_status: text(row, 13)?,
                    remarks: text(row, 14)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }
}
