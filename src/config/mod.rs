// ==========================================
// BI 資料匯入工具 - 設定層
// ==========================================
// 職責: 資料根目錄、來源目錄、各資料庫路徑、分批大小、庫存屬性對照
// 存儲: bi-import.toml（可選）
// ==========================================

pub mod config_file;
pub mod import_config;

pub use config_file::{ConfigFile, StoreOverrides, CONFIG_FILE_NAME};
pub use import_config::{ImportConfig, StorePaths, ROOT_ENV};
