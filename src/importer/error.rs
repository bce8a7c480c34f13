// ==========================================
// BI 資料匯入工具 - 匯入錯誤類型
// ==========================================
// 工具: thiserror 派生巨集
// ==========================================

use thiserror::Error;

/// 匯入流程錯誤類型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 檔案相關錯誤 =====
    #[error("找不到來源檔案: {0}")]
    FileNotFound(String),

    #[error("不支援的檔案格式: {0}（僅支援 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("檔案讀取失敗: {0}")]
    FileReadError(String),

    #[error("Excel 解析失敗: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失敗: {0}")]
    CsvParseError(String),

    #[error("工作表不存在: {file} 第 {index} 頁")]
    SheetNotFound { file: String, index: usize },

    #[error("沒有可用的來源檔案: {0}")]
    NoSourceFiles(String),

    // ===== 欄位對應錯誤 =====
    #[error("缺少必要欄位 ({table}): {column}")]
    MissingColumn { table: String, column: String },

    #[error("資料列處理失敗 (第 {row} 行): {message}")]
    RowError { row: usize, message: String },

    // ===== 資料庫錯誤 =====
    #[error("資料庫連線失敗: {0}")]
    DatabaseConnectionError(String),

    #[error("資料庫查詢失敗: {0}")]
    DatabaseQueryError(String),

    #[error("唯一約束違反: {0}")]
    UniqueConstraintViolation(String),

    #[error("資料表 {0} 沒有任何欄位")]
    EmptySchema(String),

    #[error("分批寫入失敗 ({table} 第 {chunk} 批, 已提交 {committed_rows} 筆): {message}")]
    ChunkWriteFailure {
        table: String,
        chunk: usize,
        committed_rows: usize,
        message: String,
    },

    #[error("資料庫檔案無法存取: {0}")]
    StoreIoError(String),

    // ===== 設定錯誤 =====
    #[error("設定讀取失敗 ({path}): {message}")]
    ConfigReadError { path: String, message: String },

    #[error("設定值格式錯誤 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 通用錯誤 =====
    #[error("內部錯誤: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 資料庫檔案層級的失敗（無法開啟、唯讀、磁碟 I/O）
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            ImportError::DatabaseConnectionError(_) | ImportError::StoreIoError(_)
        )
    }
}

// 實作 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 實作 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match &err {
            rusqlite::Error::SqliteFailure(e, msg) => match e.code {
                ErrorCode::ConstraintViolation
                    if msg.as_deref().is_some_and(|m| m.contains("UNIQUE")) =>
                {
                    ImportError::UniqueConstraintViolation(err.to_string())
                }
                ErrorCode::CannotOpen | ErrorCode::NotADatabase => {
                    ImportError::DatabaseConnectionError(err.to_string())
                }
                ErrorCode::ReadOnly | ErrorCode::SystemIoFailure | ErrorCode::DiskFull => {
                    ImportError::StoreIoError(err.to_string())
                }
                _ => ImportError::DatabaseQueryError(err.to_string()),
            },
            _ => ImportError::DatabaseQueryError(err.to_string()),
        }
    }
}

// 實作 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 實作 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 類型別名
pub type ImportResult<T> = Result<T, ImportError>;
