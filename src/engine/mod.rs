// ==========================================
// BI 資料匯入工具 - 引擎層
// ==========================================
// 職責: 子系統轉換流程、增量合併、完整性檢查、編排
// 紅線: SQL 只出現在 repository 與 db；引擎只組合步驟
// ==========================================

pub mod orchestrator;
pub mod subsystems;
pub mod upsert_engine;
pub mod verifier;

pub use orchestrator::{verify_groups, Orchestrator, RunSummary, SubsystemResult};
pub use subsystems::{conversion_for, ConversionReport, SubsystemConversion, TableReport};
pub use upsert_engine::UpsertEngine;
pub use verifier::{IntegrityVerifier, VerifyEntry, VerifyGroup, VerifyLine, VerifyReport};
