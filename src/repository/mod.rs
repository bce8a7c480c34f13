// ==========================================
// BI 資料匯入工具 - 資料倉儲層
// ==========================================
// 紅線: Repository 不含業務邏輯
// 職責: 整表寫入、索引、採購增量更新的 SQL
// 約束: 值一律使用參數綁定；識別字一律以 quote_ident 跳脫
// ==========================================

pub mod batch_loader;
pub mod index_builder;
pub mod procurement_repo;
pub mod schema;

pub use batch_loader::{plan_chunks, BatchLoader, LoadReport, DEFAULT_CHUNK_SIZE};
pub use index_builder::{single_indexes, IndexBuilder, IndexSpec};
pub use procurement_repo::{ProcurementRepository, PROCURE_TABLE};
