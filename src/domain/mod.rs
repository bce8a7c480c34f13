// ==========================================
// BI 資料匯入工具 - 領域模型層
// ==========================================
// 職責: 資料框、子系統與執行模式、採購項目
// 紅線: 不含資料存取邏輯
// ==========================================

pub mod frame;
pub mod procurement;
pub mod types;

pub use frame::{CanonicalFrame, CellValue, ColumnDef, ColumnKind, FieldValue, SourceFrame};
pub use procurement::{
    KeyState, ProcurementImportRow, ProcurementItem, ProcurementKey, UpsertOutcome, UpsertTally,
};
pub use types::{RunMode, Subsystem};
