// ==========================================
// BI 資料匯入工具 - 匯入層 Trait
// ==========================================
// 職責: 定義來源讀取介面（不包含實作）
// ==========================================

use crate::domain::frame::SourceFrame;
use crate::importer::error::ImportResult;
use std::path::Path;

/// 表頭判定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// 首列即表頭
    #[default]
    SingleRow,
    /// 首列若出現佔位欄名，改以第二列（合併首列）作為表頭
    AutoDetect,
}

/// 讀取哪一張工作表、如何定位表頭
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SheetSpec {
    /// 工作表索引（0 起算）
    pub index: usize,
    /// 表頭之前略過的實體列數
    pub skip_rows: usize,
    pub header: HeaderMode,
}

impl SheetSpec {
    pub fn first() -> Self {
        Self::default()
    }

    pub fn at(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    pub fn skip_rows(mut self, rows: usize) -> Self {
        self.skip_rows = rows;
        self
    }

    pub fn auto_header(mut self) -> Self {
        self.header = HeaderMode::AutoDetect;
        self
    }
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 將單一來源檔的一張工作表讀為 SourceFrame
// 實作者: ExcelParser, CsvParser
pub trait FileParser: Send + Sync {
    /// 讀取指定工作表
    ///
    /// # 錯誤
    /// - FileNotFound: 檔案不存在
    /// - SheetNotFound: 工作表索引超出範圍
    /// - ExcelParseError / CsvParseError: 檔案損毀或格式錯誤
    fn parse_sheet(&self, path: &Path, sheet: &SheetSpec) -> ImportResult<SourceFrame>;
}
