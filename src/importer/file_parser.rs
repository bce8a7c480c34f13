// ==========================================
// BI 資料匯入工具 - 檔案解析器實作
// ==========================================
// 支援: Excel (.xlsx/.xls) / CSV (.csv)
// 輸出: SourceFrame（表頭 + 具型別的儲存格）
// ==========================================

use crate::domain::frame::{is_placeholder_header, placeholder_header, CellValue, SourceFrame};
use crate::importer::date_normalizer::excel_serial_to_datetime;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::{FileParser, HeaderMode, SheetSpec};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

// ==========================================
// 表頭解析
// ==========================================

/// 由原始格線建立 SourceFrame
///
/// - 略過 `skip_rows` 列後，首列為表頭
/// - 空白表頭 → "Unnamed: {欄位索引}"
/// - 重複表頭 → 依序加上 ".1"、".2" 後綴
/// - 完全空白的資料列略過
pub fn frame_from_grid(
    source: &str,
    grid: Vec<Vec<CellValue>>,
    sheet: &SheetSpec,
) -> SourceFrame {
    let mut rows = grid.into_iter().skip(sheet.skip_rows);

    let first = match rows.next() {
        Some(row) => row,
        None => return SourceFrame::new(source, Vec::new(), Vec::new()),
    };
    let rest: Vec<Vec<CellValue>> = rows.collect();
    let max_width = rest.iter().map(Vec::len).chain(std::iter::once(first.len())).max().unwrap_or(0);

    let mut headers = header_names(&first, max_width);
    let mut data_start = 0;

    if sheet.header == HeaderMode::AutoDetect
        && headers.iter().any(|h| is_placeholder_header(h))
    {
        if let Some(second) = rest.first() {
            debug!(source, "表頭含佔位欄名，改用第二列表頭");
            headers = (0..max_width)
                .map(|i| {
                    let lower = second.get(i).map(|c| c.to_text().trim().to_string());
                    let upper = first.get(i).map(|c| c.to_text().trim().to_string());
                    match (lower, upper) {
                        (Some(l), _) if !l.is_empty() => l,
                        (_, Some(u)) if !u.is_empty() => u,
                        _ => placeholder_header(i),
                    }
                })
                .collect();
            data_start = 1;
        }
    }

    dedup_headers(&mut headers);

    let data = rest
        .into_iter()
        .skip(data_start)
        .filter(|row| !row.iter().all(CellValue::is_empty))
        .collect();

    SourceFrame::new(source, headers, data)
}

fn header_names(row: &[CellValue], width: usize) -> Vec<String> {
    (0..width)
        .map(|i| {
            let text = row
                .get(i)
                .map(|c| c.to_text().trim().to_string())
                .unwrap_or_default();
            if text.is_empty() {
                placeholder_header(i)
            } else {
                text
            }
        })
        .collect()
}

fn dedup_headers(headers: &mut [String]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for header in headers.iter_mut() {
        let count = seen.entry(header.clone()).or_insert(0);
        if *count > 0 {
            let renamed = format!("{}.{}", header, count);
            *count += 1;
            *header = renamed;
        } else {
            *count = 1;
        }
    }
}

// ==========================================
// CSV Parser 實作
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// CSV 儲存格：純數值文字視為數字（保留前導零的代碼維持文字）
    fn cell_from_text(raw: &str) -> CellValue {
        let text = raw.trim();
        if text.is_empty() {
            return CellValue::Empty;
        }

        let leading_zero = text.len() > 1
            && text.starts_with('0')
            && !text.starts_with("0.");
        if !leading_zero {
            if let Ok(n) = text.parse::<f64>() {
                if n.is_finite() {
                    return CellValue::Number(n);
                }
            }
        }
        CellValue::Text(raw.to_string())
    }
}

impl FileParser for CsvParser {
    fn parse_sheet(&self, path: &Path, sheet: &SheetSpec) -> ImportResult<SourceFrame> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        if sheet.index > 0 {
            return Err(ImportError::SheetNotFound {
                file: path.display().to_string(),
                index: sheet.index,
            });
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允許行長度不一致
            .from_reader(file);

        let mut grid = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row = record
                .iter()
                .map(|v| Self::cell_from_text(v.trim_start_matches('\u{feff}')))
                .collect();
            grid.push(row);
        }

        Ok(frame_from_grid(&source_name(path), grid, sheet))
    }
}

// ==========================================
// Excel Parser 實作
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    fn cell_from_data(cell: &Data) -> CellValue {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) if s.trim().is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Text(if *b { "True" } else { "False" }.to_string()),
            Data::DateTime(dt) => {
                let serial = dt.as_f64();
                excel_serial_to_datetime(serial)
                    .map(CellValue::DateTime)
                    .unwrap_or(CellValue::Number(serial))
            }
            Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .map(CellValue::DateTime)
                .unwrap_or_else(|_| CellValue::Text(s.clone())),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

impl FileParser for ExcelParser {
    fn parse_sheet(&self, path: &Path, sheet: &SheetSpec) -> ImportResult<SourceFrame> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(sheet.index)
            .ok_or_else(|| ImportError::SheetNotFound {
                file: path.display().to_string(),
                index: sheet.index,
            })??;

        // 使用範圍的起點可能不在 A1，補回前置的列與欄
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut grid: Vec<Vec<CellValue>> = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![CellValue::Empty; col_offset];
            cells.extend(row.iter().map(Self::cell_from_data));
            grid.push(cells);
        }

        Ok(frame_from_grid(&source_name(path), grid, sheet))
    }
}

// ==========================================
// 通用檔案解析器（依副檔名自動選擇）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P, sheet: &SheetSpec) -> ImportResult<SourceFrame> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_sheet(path, sheet),
            "xlsx" | "xls" | "xlsm" => ExcelParser.parse_sheet(path, sheet),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_blank_and_duplicate_headers() {
        let grid = vec![
            vec![text("單據編號"), CellValue::Empty, text("備註"), text("備註")],
            vec![text("S1"), text("x"), text("a"), text("b")],
        ];
        let frame = frame_from_grid("t", grid, &SheetSpec::first());

        assert_eq!(
            frame.headers(),
            &["單據編號", "Unnamed: 1", "備註", "備註.1"]
        );
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn test_skip_rows_before_header() {
        let grid = vec![
            vec![text("服務登記卡")],
            vec![text("列印日期")],
            vec![text("服務登記號"), text("客戶名稱")],
            vec![text("R1"), text("Alice")],
        ];
        let frame = frame_from_grid("t", grid, &SheetSpec::first().skip_rows(2));

        assert_eq!(frame.headers(), &["服務登記號", "客戶名稱"]);
        assert_eq!(frame.cell(0, 1), &text("Alice"));
    }

    #[test]
    fn test_auto_header_uses_second_row() {
        let grid = vec![
            vec![text("明細"), CellValue::Empty, CellValue::Empty],
            vec![text("服務登記號"), text("產品名稱"), text("數量")],
            vec![text("R1"), text("冷氣"), CellValue::Number(1.0)],
        ];
        let frame = frame_from_grid("t", grid, &SheetSpec::at(1).auto_header());

        assert_eq!(frame.headers(), &["服務登記號", "產品名稱", "數量"]);
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn test_blank_rows_skipped() {
        let grid = vec![
            vec![text("a")],
            vec![CellValue::Empty],
            vec![text("1")],
        ];
        let frame = frame_from_grid("t", grid, &SheetSpec::first());
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn test_csv_parser_keeps_leading_zero_codes() {
        let mut temp_file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(temp_file, "客戶代碼,聯絡電話,交易數量").unwrap();
        writeln!(temp_file, "C001,0912345678,12").unwrap();
        temp_file.flush().unwrap();

        let frame = UniversalFileParser
            .parse(temp_file.path(), &SheetSpec::first())
            .unwrap();
        assert_eq!(frame.cell(0, 1), &text("0912345678"));
        assert_eq!(frame.cell(0, 2), &CellValue::Number(12.0));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = UniversalFileParser.parse("data.txt", &SheetSpec::first());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = ExcelParser.parse_sheet(Path::new("/nonexistent/x.xlsx"), &SheetSpec::first());
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }
}
