// ==========================================
// BI 資料匯入工具 - 資料完整性檢查
// ==========================================
// 依查詢系統分組，逐表回報筆數
// 缺檔、缺表、查詢失敗都只是一行警告，後續項目照常檢查
// ==========================================

use crate::config::ImportConfig;
use crate::db::{count_rows, open_sqlite_readonly, table_exists};
use crate::domain::types::Subsystem;
use crate::repository::PROCURE_TABLE;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 下游查詢系統
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyGroup {
    SalesSystem,
    Inventory,
    Procurement,
}

impl VerifyGroup {
    pub const ALL: [VerifyGroup; 3] = [VerifyGroup::SalesSystem, VerifyGroup::Inventory, VerifyGroup::Procurement];

    pub fn label_key(&self) -> &'static str {
        match self {
            VerifyGroup::SalesSystem => "verify.group.sales_system",
            VerifyGroup::Inventory => "verify.group.inventory",
            VerifyGroup::Procurement => "verify.group.procurement",
        }
    }

    /// 此群組檢查的 (子系統, 資料表, 標籤鍵)
    pub fn entries(&self) -> Vec<(Subsystem, &'static str, &'static str)> {
        match self {
            VerifyGroup::SalesSystem => vec![
                (Subsystem::Sales, "sales_main", "verify.table.sales_main"),
                (Subsystem::Sales, "sales_detail", "verify.table.sales_detail"),
                (Subsystem::Repair, "repair_data", "verify.table.repair_data"),
                (Subsystem::Custody, "custody_main", "verify.table.custody_main"),
                (Subsystem::Custody, "custody_detail", "verify.table.custody_detail"),
                (Subsystem::Customer, "customer_basic", "verify.table.customer_basic"),
                (Subsystem::ServiceCard, "service_card_data", "verify.table.service_card_data"),
                (Subsystem::ServiceCard, "service_card_detail", "verify.table.service_card_detail"),
                (Subsystem::CrmNotes, "crm_notes", "verify.table.crm_notes"),
                (Subsystem::SalesAi, "sales_data", "verify.table.sales_data"),
            ],
            VerifyGroup::Inventory => vec![(Subsystem::Inventory, "inventory_data", "verify.table.inventory_data")],
            VerifyGroup::Procurement => vec![(Subsystem::Procurement, PROCURE_TABLE, "verify.table.procure_items")],
        }
    }
}

/// 單一項目的檢查結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum VerifyLine {
    Count(i64),
    MissingStore,
    MissingTable,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyEntry {
    pub group: VerifyGroup,
    pub store: PathBuf,
    pub table: String,
    pub label_key: String,
    pub line: VerifyLine,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    pub entries: Vec<VerifyEntry>,
}

impl VerifyReport {
    pub fn warnings(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !matches!(e.line, VerifyLine::Count(_)))
            .count()
    }

    pub fn line_for(&self, table: &str) -> Option<&VerifyLine> {
        self.entries.iter().find(|e| e.table == table).map(|e| &e.line)
    }
}

pub struct IntegrityVerifier;

impl IntegrityVerifier {
    /// 檢查單一資料表
    pub fn check(&self, store: &Path, table: &str) -> VerifyLine {
        if !store.exists() {
            return VerifyLine::MissingStore;
        }
        let conn = match open_sqlite_readonly(store) {
            Ok(conn) => conn,
            Err(e) => return VerifyLine::Failed(e.to_string()),
        };
        match table_exists(&conn, table) {
            Ok(false) => VerifyLine::MissingTable,
            Ok(true) => match count_rows(&conn, table) {
                Ok(n) => VerifyLine::Count(n),
                Err(e) => VerifyLine::Failed(e.to_string()),
            },
            Err(e) => VerifyLine::Failed(e.to_string()),
        }
    }

    /// 依序檢查指定群組
    pub fn verify(&self, config: &ImportConfig, groups: &[VerifyGroup]) -> VerifyReport {
        let mut report = VerifyReport::default();
        for group in groups {
            info!(group = ?group, "資料完整性檢查");
            for (subsystem, table, label_key) in group.entries() {
                let store = config.store_for(subsystem);
                let line = self.check(store, table);
                match &line {
                    VerifyLine::Count(n) => info!(table, rows = n, "筆數"),
                    VerifyLine::MissingStore => warn!(store = %store.display(), "找不到資料庫"),
                    VerifyLine::MissingTable => warn!(store = %store.display(), table, "找不到資料表"),
                    VerifyLine::Failed(e) => warn!(table, error = %e, "檢查失敗"),
                }
                report.entries.push(VerifyEntry {
                    group: *group,
                    store: store.to_path_buf(),
                    table: table.to_string(),
                    label_key: label_key.to_string(),
                    line,
                });
            }
        }
        report
    }
}
