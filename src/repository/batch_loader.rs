// ==========================================
// BI 資料匯入工具 - 分批寫入器
// ==========================================
// 流程: DROP TABLE → CREATE TABLE → 分批 INSERT（每批一個交易）
// 限制: 單一語句的綁定參數數量不超過 SQLite 上限
// 失敗: 中止該表寫入；先前已提交的批次保留
// ==========================================

use crate::db::quote_ident;
use crate::domain::frame::{CanonicalFrame, CanonicalRow, ColumnDef};
use crate::importer::error::{ImportError, ImportResult};
use rusqlite::{params_from_iter, Connection, Transaction};
use serde::Serialize;
use std::ops::Range;
use tracing::{info, warn};

/// SQLite 綁定參數上限（SQLITE_MAX_VARIABLE_NUMBER，3.32 以後預設值）
pub const SQLITE_MAX_VARIABLES: usize = 32_766;

/// 預設每批筆數
pub const DEFAULT_CHUNK_SIZE: usize = 1_000;

/// 將 total 筆切成每批 size 筆（最後一批可較小）
pub fn plan_chunks(total: usize, size: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    (0..total)
        .step_by(size)
        .map(|start| start..(start + size).min(total))
        .collect()
}

/// 單一 INSERT 語句可容納的列數
pub fn rows_per_statement(chunk_len: usize, column_count: usize) -> usize {
    if column_count == 0 {
        return 1;
    }
    (SQLITE_MAX_VARIABLES / column_count).min(chunk_len).max(1)
}

/// 寫入結果
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub table: String,
    pub rows_written: usize,
    pub chunks: usize,
}

pub struct BatchLoader {
    chunk_size: usize,
}

impl Default for BatchLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl BatchLoader {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// CREATE TABLE 語句
    pub fn create_table_sql(table: &str, columns: &[ColumnDef], surrogate_id: bool) -> String {
        let mut defs = Vec::with_capacity(columns.len() + 1);
        if surrogate_id {
            defs.push("id INTEGER PRIMARY KEY AUTOINCREMENT".to_string());
        }
        defs.extend(
            columns
                .iter()
                .map(|c| format!("{} {}", quote_ident(&c.name), c.kind.sql_type())),
        );
        format!("CREATE TABLE {} ({})", quote_ident(table), defs.join(", "))
    }

    /// 以資料框整表取代資料表
    ///
    /// # 錯誤
    /// - EmptySchema: 資料框沒有任何欄位
    /// - ChunkWriteFailure: 某一批寫入失敗（先前批次已提交）
    pub fn replace_table(
        &self,
        conn: &mut Connection,
        table: &str,
        frame: &CanonicalFrame,
        surrogate_id: bool,
    ) -> ImportResult<LoadReport> {
        if frame.columns().is_empty() {
            return Err(ImportError::EmptySchema(table.to_string()));
        }

        let total = frame.len();
        info!(
            table,
            total,
            chunk_size = self.chunk_size,
            "開始分批寫入"
        );

        let tx = conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))?;
        tx.execute_batch(&Self::create_table_sql(table, frame.columns(), surrogate_id))?;
        tx.commit()?;

        let chunks = plan_chunks(total, self.chunk_size);
        let mut written = 0usize;

        for (chunk_idx, range) in chunks.iter().enumerate() {
            let rows = &frame.rows()[range.clone()];
            let result = conn
                .transaction()
                .and_then(|tx| {
                    Self::insert_rows(&tx, table, frame.columns(), rows)?;
                    tx.commit()
                });

            if let Err(e) = result {
                warn!(
                    table,
                    chunk = chunk_idx + 1,
                    committed_rows = written,
                    error = %e,
                    "分批寫入失敗，中止此表"
                );
                return Err(ImportError::ChunkWriteFailure {
                    table: table.to_string(),
                    chunk: chunk_idx + 1,
                    committed_rows: written,
                    message: e.to_string(),
                });
            }

            written += rows.len();
            info!(
                table,
                progress = written,
                total,
                percent = format!("{:.1}", written as f64 / total as f64 * 100.0),
                "寫入進度"
            );
        }

        info!(table, rows = written, "寫入完成");
        Ok(LoadReport {
            table: table.to_string(),
            rows_written: written,
            chunks: chunks.len(),
        })
    }

    /// 多列 INSERT，每個語句受綁定參數上限約束
    fn insert_rows(
        tx: &Transaction,
        table: &str,
        columns: &[ColumnDef],
        rows: &[CanonicalRow],
    ) -> rusqlite::Result<()> {
        let per_stmt = rows_per_statement(rows.len(), columns.len());
        let column_list = columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let tuple = format!("({})", vec!["?"; columns.len()].join(", "));

        for group in rows.chunks(per_stmt) {
            let sql = format!(
                "INSERT INTO {} ({}) VALUES {}",
                quote_ident(table),
                column_list,
                vec![tuple.as_str(); group.len()].join(", ")
            );
            let mut stmt = tx.prepare_cached(&sql)?;
            stmt.execute(params_from_iter(group.iter().flatten()))?;
        }
        Ok(())
    }
}
