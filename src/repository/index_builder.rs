// ==========================================
// BI 資料匯入工具 - 索引建立器
// ==========================================
// 只為欄位全部存在的索引建立；單一索引失敗只記錄警告
// ==========================================

use crate::db::{quote_ident, table_columns};
use rusqlite::Connection;
use tracing::{debug, info, warn};

/// 索引定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub columns: Vec<String>,
}

impl IndexSpec {
    pub fn single(name: &str, column: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: vec![column.to_string()],
        }
    }

    pub fn compound(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn create_sql(&self, table: &str) -> String {
        let cols = self
            .columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quote_ident(&self.name),
            quote_ident(table),
            cols
        )
    }
}

/// 以 (索引名, 欄位) 清單建立單欄索引定義
pub fn single_indexes(pairs: &[(&str, &str)]) -> Vec<IndexSpec> {
    pairs
        .iter()
        .map(|(name, column)| IndexSpec::single(name, column))
        .collect()
}

pub struct IndexBuilder;

impl IndexBuilder {
    /// 建立索引，回傳成功建立的數量
    pub fn build(&self, conn: &Connection, table: &str, specs: &[IndexSpec]) -> usize {
        let existing = match table_columns(conn, table) {
            Ok(cols) => cols,
            Err(e) => {
                warn!(table, error = %e, "讀取欄位失敗，略過索引建立");
                return 0;
            }
        };

        let mut built = 0;
        for spec in specs {
            if let Some(missing) = spec.columns.iter().find(|c| !existing.contains(c)) {
                debug!(table, index = %spec.name, column = %missing, "欄位不存在，略過索引");
                continue;
            }
            match conn.execute_batch(&spec.create_sql(table)) {
                Ok(()) => built += 1,
                Err(e) => warn!(table, index = %spec.name, error = %e, "建立索引失敗"),
            }
        }

        info!(table, built, requested = specs.len(), "索引建立完成");
        built
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' ORDER BY name")
            .unwrap();
        stmt.query_map([], |r| r.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap()
    }

    #[test]
    fn test_build_skips_absent_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE sales_main (\"單據編號\" TEXT, \"客戶名稱\" TEXT)")
            .unwrap();

        let specs = vec![
            IndexSpec::single("idx_sales_main_doc_no", "單據編號"),
            IndexSpec::single("idx_sales_main_phone", "聯絡電話"),
            IndexSpec::compound("idx_doc_customer", &["單據編號", "客戶名稱"]),
        ];
        let built = IndexBuilder.build(&conn, "sales_main", &specs);

        assert_eq!(built, 2);
        assert_eq!(index_names(&conn), vec!["idx_doc_customer", "idx_sales_main_doc_no"]);
    }

    #[test]
    fn test_build_is_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (a TEXT)").unwrap();
        let specs = single_indexes(&[("idx_a", "a")]);
        assert_eq!(IndexBuilder.build(&conn, "t", &specs), 1);
        assert_eq!(IndexBuilder.build(&conn, "t", &specs), 1);
    }

    #[test]
    fn test_missing_table_builds_nothing() {
        let conn = Connection::open_in_memory().unwrap();
        let specs = single_indexes(&[("idx_a", "a")]);
        assert_eq!(IndexBuilder.build(&conn, "absent", &specs), 0);
    }
}
