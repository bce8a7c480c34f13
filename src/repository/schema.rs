// ==========================================
// BI 資料匯入工具 - 固定結構資料表
// ==========================================
// 大多數資料表依來源欄位動態建立（BatchLoader）；
// 這裡只放由下游系統寫入、匯入時只建結構的表
// ==========================================

use rusqlite::Connection;

/// 客戶聯絡人（僅建立結構，由客戶查詢系統維護）
pub const CREATE_CUSTOMER_CONTACTS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS customer_contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    客戶代碼 TEXT,
    聯絡人姓名 TEXT,
    聯絡電話 TEXT,
    聯絡手機 TEXT,
    電子郵件 TEXT,
    職稱 TEXT,
    備註 TEXT,
    FOREIGN KEY (客戶代碼) REFERENCES customer_basic(客戶代碼)
)
"#;

/// 客戶送貨地址（僅建立結構）
pub const CREATE_CUSTOMER_ADDRESSES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS customer_addresses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    客戶代碼 TEXT,
    地址名稱 TEXT,
    送貨地址 TEXT,
    郵遞區號 TEXT,
    聯絡人 TEXT,
    聯絡電話 TEXT,
    是否預設 INTEGER DEFAULT 0,
    備註 TEXT,
    FOREIGN KEY (客戶代碼) REFERENCES customer_basic(客戶代碼)
)
"#;

/// 建立客戶附屬表
pub fn create_customer_side_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_CUSTOMER_CONTACTS_SQL)?;
    conn.execute_batch(CREATE_CUSTOMER_ADDRESSES_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::table_columns;

    #[test]
    fn test_customer_side_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_customer_side_tables(&conn).unwrap();
        create_customer_side_tables(&conn).unwrap();

        let cols = table_columns(&conn, "customer_addresses").unwrap();
        assert_eq!(cols[0], "id");
        assert!(cols.contains(&"是否預設".to_string()));
        assert_eq!(table_columns(&conn, "customer_contacts").unwrap().len(), 8);
    }
}
