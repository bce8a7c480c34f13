// ==========================================
// BI 資料匯入工具 - SQLite 連線初始化
// ==========================================
// 目標:
// - 統一所有 Connection::open 的 PRAGMA 行為
// - 統一 busy_timeout，下游查詢服務同時讀取時減少 busy 錯誤
// ==========================================

use crate::perf::install_sqlite_tracing;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::time::Duration;

/// 預設 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 連線的統一 PRAGMA
///
/// foreign_keys 與 busy_timeout 都需要「每個連線」單獨設定
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 開啟（不存在則建立）資料庫檔案並套用統一配置
pub fn open_sqlite_connection(db_path: &Path) -> rusqlite::Result<Connection> {
    let mut conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    install_sqlite_tracing(&mut conn);
    Ok(conn)
}

/// 以唯讀方式開啟既有資料庫（不會建立新檔）
pub fn open_sqlite_readonly(db_path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(conn)
}

/// 以雙引號跳脫識別字（中文欄名、保留字）
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// 資料表是否存在
pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1 LIMIT 1",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// 讀取資料表欄位名稱（PRAGMA table_info）
pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// 資料表筆數
pub fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
        [],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_quote_ident_escapes() {
        assert_eq!(quote_ident("客戶名稱"), "\"客戶名稱\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_table_helpers() {
        let dir = TempDir::new().unwrap();
        let conn = open_sqlite_connection(&dir.path().join("t.db")).unwrap();
        conn.execute_batch("CREATE TABLE \"銷售\" (\"單據編號\" TEXT, qty INTEGER); INSERT INTO \"銷售\" VALUES ('A', 1);")
            .unwrap();

        assert!(table_exists(&conn, "銷售").unwrap());
        assert!(!table_exists(&conn, "missing").unwrap());
        assert_eq!(table_columns(&conn, "銷售").unwrap(), vec!["單據編號", "qty"]);
        assert_eq!(count_rows(&conn, "銷售").unwrap(), 1);
    }

    #[test]
    fn test_readonly_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.db");
        assert!(open_sqlite_readonly(&path).is_err());
        assert!(!path.exists());
    }
}
