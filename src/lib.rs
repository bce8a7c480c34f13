// ==========================================
// BI 資料匯入工具 - 核心函式庫
// ==========================================
// 將各舊系統匯出的試算表對帳、清理後寫入查詢系統使用的 SQLite 資料庫
// 技術棧: calamine / csv + rusqlite + tracing
// ==========================================

// 初始化國際化系統
rust_i18n::i18n!("locales", fallback = "zh-TW");

// ==========================================
// 模組宣告
// ==========================================

// 領域層 - 資料框與類型
pub mod domain;

// 資料倉儲層 - 寫入與索引
pub mod repository;

// 引擎層 - 子系統轉換與編排
pub mod engine;

// 匯入層 - 檔案解析與欄位對帳
pub mod importer;

// 設定層
pub mod config;

// 資料庫基礎設施（連線初始化 / PRAGMA 統一）
pub mod db;

// 日誌系統
pub mod logging;

// 效能統計
pub mod perf;

// 國際化
pub mod i18n;

// ==========================================
// 重新匯出核心類型
// ==========================================

pub use config::ImportConfig;
pub use domain::types::{RunMode, Subsystem};
pub use engine::{IntegrityVerifier, Orchestrator, RunSummary, UpsertEngine};
pub use importer::{ImportError, ImportResult};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "BI 系統整合資料匯入工具";
