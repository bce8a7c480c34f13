// ==========================================
// BI 資料匯入工具 - 來源檔讀取
// ==========================================
// 缺檔: 警告並略過該來源；全部缺檔才視為失敗
// ==========================================

use crate::config::ImportConfig;
use crate::domain::frame::SourceFrame;
use crate::engine::subsystems::ConversionReport;
use crate::importer::date_normalizer::{DateNormalizer, DateVariant};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::SheetSpec;
use tracing::{info, warn};

/// 一個來源檔與其日期格式
#[derive(Debug, Clone, Copy)]
pub struct SourceFile {
    pub name: &'static str,
    pub variant: DateVariant,
}

impl SourceFile {
    pub const fn standard(name: &'static str) -> Self {
        Self {
            name,
            variant: DateVariant::Standard,
        }
    }

    pub const fn slash_first(name: &'static str) -> Self {
        Self {
            name,
            variant: DateVariant::SlashFirst,
        }
    }
}

/// 讀取一組來源檔，並正規化指定日期欄
///
/// # 錯誤
/// - NoSourceFiles: 所有來源檔都不存在
/// - 解析錯誤: 直接傳回（中止此子系統）
pub fn load_sources(
    config: &ImportConfig,
    files: &[SourceFile],
    sheet: &SheetSpec,
    date_columns: &[&str],
    report: &mut ConversionReport,
) -> ImportResult<Vec<SourceFrame>> {
    let parser = UniversalFileParser;
    let mut frames = Vec::with_capacity(files.len());

    for file in files {
        let path = config.source_path(file.name);
        if !path.exists() {
            warn!(path = %path.display(), "找不到來源檔案，略過");
            report.missing_sources.push(file.name.to_string());
            continue;
        }

        let mut frame = parser.parse(&path, sheet)?;
        info!(source = file.name, rows = frame.len(), "讀取來源檔案");

        let dates = DateNormalizer::new(file.variant).normalize_frame(&mut frame, date_columns);
        report.date_columns.extend(dates);
        report.sources_read.push(file.name.to_string());
        frames.push(frame);
    }

    if frames.is_empty() {
        let names: Vec<&str> = files.iter().map(|f| f.name).collect();
        return Err(ImportError::NoSourceFiles(names.join(", ")));
    }
    Ok(frames)
}

/// 讀取單一來源檔（不做日期正規化）
pub fn load_single(
    config: &ImportConfig,
    file_name: &str,
    sheet: &SheetSpec,
    report: &mut ConversionReport,
) -> ImportResult<SourceFrame> {
    let path = config.source_path(file_name);
    if !path.exists() {
        warn!(path = %path.display(), "找不到來源檔案");
        report.missing_sources.push(file_name.to_string());
        return Err(ImportError::NoSourceFiles(file_name.to_string()));
    }

    let frame = UniversalFileParser.parse(&path, sheet)?;
    info!(source = file_name, rows = frame.len(), "讀取來源檔案");
    report.sources_read.push(file_name.to_string());
    Ok(frame)
}
