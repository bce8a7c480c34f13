// ==========================================
// BI 資料匯入工具 - 匯入層
// ==========================================
// 職責: 讀取異質試算表，轉為子系統標準資料框
// 支援: Excel (.xlsx/.xls/.xlsm), CSV
// 流程: 解析 → 日期正規化 → 欄位對帳 → 去重
// ==========================================

pub mod conflict_handler;
pub mod data_cleaner;
pub mod date_normalizer;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;

pub use conflict_handler::ConflictHandler;
pub use data_cleaner::{DataCleaner, NumericFallback};
pub use date_normalizer::{DateNormalizer, DateStrategy, DateVariant};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{ColumnRule, ColumnRules, FieldMapper, ReconcileReport};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use importer_trait::{FileParser, HeaderMode, SheetSpec};
