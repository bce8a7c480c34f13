// ==========================================
// BI 資料匯入工具 - 子系統轉換
// ==========================================
// 每個子系統: 讀取來源 → 日期正規化 → 欄位對帳 → 去重 → 寫入 → 索引
// 每個轉換自行開啟、提交、關閉自己的資料庫連線
// ==========================================

pub mod crm_notes;
pub mod custody;
pub mod customer;
pub mod inventory;
pub mod procurement;
pub mod repair;
pub mod sales;
pub mod sales_ai;
pub mod service_card;
pub mod sources;

use crate::config::ImportConfig;
use crate::db::open_sqlite_connection;
use crate::domain::frame::CanonicalFrame;
use crate::domain::procurement::UpsertTally;
use crate::domain::types::Subsystem;
use crate::importer::date_normalizer::ColumnDateReport;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::ReconcileReport;
use crate::perf::install_sqlite_tracing;
use crate::repository::{BatchLoader, IndexBuilder, IndexSpec};
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub use crm_notes::CrmNotesConversion;
pub use custody::CustodyConversion;
pub use customer::CustomerConversion;
pub use inventory::InventoryConversion;
pub use procurement::ProcurementConversion;
pub use repair::RepairConversion;
pub use sales::SalesConversion;
pub use sales_ai::SalesAiConversion;
pub use service_card::ServiceCardConversion;

// ==========================================
// 轉換結果
// ==========================================

/// 單一資料表寫入結果
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table: String,
    pub rows: usize,
    pub indexes: usize,
}

/// 單一子系統轉換結果
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub subsystem: Subsystem,
    pub store: PathBuf,
    pub sources_read: Vec<String>,
    pub missing_sources: Vec<String>,
    pub date_columns: Vec<ColumnDateReport>,
    pub reconcile: Vec<ReconcileReport>,
    pub tables: Vec<TableReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsert: Option<UpsertTally>,
}

impl ConversionReport {
    pub fn new(subsystem: Subsystem, store: &Path) -> Self {
        Self {
            subsystem,
            store: store.to_path_buf(),
            sources_read: Vec::new(),
            missing_sources: Vec::new(),
            date_columns: Vec::new(),
            reconcile: Vec::new(),
            tables: Vec::new(),
            upsert: None,
        }
    }

    /// 所有來源缺少的標準欄（"資料表.欄位"）
    pub fn mapping_gaps(&self) -> Vec<String> {
        self.reconcile
            .iter()
            .flat_map(|r| r.gaps.iter().map(move |g| format!("{}.{}", r.table, g)))
            .collect()
    }

    pub fn rows_written(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

// ==========================================
// 轉換介面
// ==========================================

pub trait SubsystemConversion {
    fn subsystem(&self) -> Subsystem;

    /// 執行轉換；錯誤只影響此子系統
    fn convert(&self, config: &ImportConfig) -> ImportResult<ConversionReport>;
}

/// 取得子系統對應的轉換
pub fn conversion_for(subsystem: Subsystem) -> Box<dyn SubsystemConversion> {
    match subsystem {
        Subsystem::Customer => Box::new(CustomerConversion),
        Subsystem::Sales => Box::new(SalesConversion),
        Subsystem::Repair => Box::new(RepairConversion),
        Subsystem::Custody => Box::new(CustodyConversion),
        Subsystem::ServiceCard => Box::new(ServiceCardConversion),
        Subsystem::CrmNotes => Box::new(CrmNotesConversion),
        Subsystem::SalesAi => Box::new(SalesAiConversion),
        Subsystem::Procurement => Box::new(ProcurementConversion),
        Subsystem::Inventory => Box::new(InventoryConversion),
    }
}

// ==========================================
// 共用步驟
// ==========================================

/// 開啟子系統資料庫（自動建立所在目錄）
pub(crate) fn open_store(path: &Path) -> ImportResult<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut conn = open_sqlite_connection(path)?;
    install_sqlite_tracing(&mut conn);
    Ok(conn)
}

/// 整表取代後建立索引，並記入報告
pub(crate) fn write_table(
    conn: &mut Connection,
    config: &ImportConfig,
    table: &str,
    frame: &CanonicalFrame,
    surrogate_id: bool,
    indexes: &[IndexSpec],
    report: &mut ConversionReport,
) -> ImportResult<()> {
    let loaded = BatchLoader::new(config.chunk_size).replace_table(conn, table, frame, surrogate_id)?;
    let built = IndexBuilder.build(conn, table, indexes);
    report.tables.push(TableReport {
        table: table.to_string(),
        rows: loaded.rows_written,
        indexes: built,
    });
    Ok(())
}
