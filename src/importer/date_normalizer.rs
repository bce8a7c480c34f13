// ==========================================
// BI 資料匯入工具 - 日期欄位正規化
// ==========================================
// 職責: 將來源日期欄（型別日期 / Excel 序列號 / 各式文字）
//       統一為日期時間值，無法解析者保留原值
// 策略順序（標準）: 型別日期 → 序列號 → 固定格式 → 通用解析 → 保留原值
// 策略順序（斜線優先）: 型別日期 → YYYY/MM/DD → 通用解析 → 保留原值
// ==========================================

use crate::domain::frame::{CellValue, SourceFrame};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Excel 序列號有效範圍（含端點）
pub const SERIAL_MIN: f64 = 1.0;
pub const SERIAL_MAX: f64 = 100_000.0;

/// 依序嘗試的固定格式；第一個至少解析成功一筆者勝出
pub const DATE_PATTERNS: [&str; 7] = [
    "%Y/%m/%d",
    "%Y-%m-%d",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y%m%d",
];

const GENERIC_DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const GENERIC_DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%Y年%m月%d日",
    "%d-%b-%Y",
    "%b %d, %Y",
];

// 中英文星期標註：(一)、（週三）、(星期日)、(Mon) ...
static WEEKDAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\s*[（(]\s*(?:[一二三四五六日天]|週[一二三四五六日天]|星期[一二三四五六日天]|(?i:mon|tue|wed|thu|fri|sat|sun))\s*[)）]\s*",
    )
    .expect("valid weekday regex")
});

static SLASH_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}/\d{1,2}/\d{1,2}$").expect("valid slash date regex"));

// ==========================================
// 基礎轉換函式
// ==========================================

/// Excel 序列號 → 日期時間（紀元 1899-12-30，小數部分為時間）
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    // 9999-12-31 以後無意義
    if !serial.is_finite() || serial.abs() > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::seconds(seconds))
}

/// 序列號是否在有效範圍內
pub fn is_serial_in_range(value: f64) -> bool {
    (SERIAL_MIN..=SERIAL_MAX).contains(&value)
}

/// 移除星期標註並去除前後空白
pub fn strip_weekday(text: &str) -> String {
    WEEKDAY_RE.replace_all(text, "").trim().to_string()
}

/// 以單一格式解析（日期或日期時間）
pub fn parse_with_pattern(text: &str, pattern: &str) -> Option<NaiveDateTime> {
    if pattern == "%Y%m%d" {
        return parse_compact(text);
    }
    if pattern.contains("%H") {
        NaiveDateTime::parse_from_str(text, pattern).ok()
    } else {
        NaiveDate::parse_from_str(text, pattern)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}

/// 緊湊格式 YYYYMMDD（恰好 8 位數字）
fn parse_compact(text: &str) -> Option<NaiveDateTime> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = text[0..4].parse().ok()?;
    let month = text[4..6].parse().ok()?;
    let day = text[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

/// 通用解析：嘗試常見日期/日期時間寫法
pub fn parse_generic(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    GENERIC_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            GENERIC_DATE_FORMATS
                .iter()
                .find_map(|fmt| match *fmt {
                    "%Y%m%d" => parse_compact(text).map(|d| d.date()),
                    _ => NaiveDate::parse_from_str(text, fmt).ok(),
                })
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ==========================================
// DateVariant / DateStrategy
// ==========================================

/// 策略變體
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DateVariant {
    /// 標準策略
    #[default]
    Standard,
    /// 斜線優先（昇峰銷售資料）
    SlashFirst,
}

/// 實際生效的策略
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DateStrategy {
    AllEmpty,
    Typed,
    Serial,
    Pattern(String),
    SlashDate,
    Generic,
    Unparsed,
}

impl fmt::Display for DateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateStrategy::AllEmpty => write!(f, "全部為空"),
            DateStrategy::Typed => write!(f, "日期型別"),
            DateStrategy::Serial => write!(f, "Excel 序列號"),
            DateStrategy::Pattern(p) => write!(f, "格式 {}", p),
            DateStrategy::SlashDate => write!(f, "YYYY/MM/DD"),
            DateStrategy::Generic => write!(f, "通用解析"),
            DateStrategy::Unparsed => write!(f, "保留原值"),
        }
    }
}

/// 單一日期欄的處理結果
#[derive(Debug, Clone, Serialize)]
pub struct ColumnDateReport {
    pub column: String,
    pub strategy: DateStrategy,
    pub non_empty: usize,
    pub converted: usize,
}

// ==========================================
// DateNormalizer
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct DateNormalizer {
    variant: DateVariant,
}

impl DateNormalizer {
    pub fn new(variant: DateVariant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> DateVariant {
        self.variant
    }

    /// 正規化資料框中的指定欄位；不存在的欄位略過
    pub fn normalize_frame(&self, frame: &mut SourceFrame, columns: &[&str]) -> Vec<ColumnDateReport> {
        let mut reports = Vec::new();

        for column in columns {
            let Some(idx) = frame.column_index(column) else {
                continue;
            };
            let values = frame.column(idx);
            let (normalized, strategy) = self.normalize_column(&values);

            let non_empty = values.iter().filter(|v| !v.is_empty()).count();
            let converted = normalized
                .iter()
                .filter(|v| matches!(v, CellValue::DateTime(_)))
                .count();

            match strategy {
                DateStrategy::AllEmpty => debug!(column, "日期欄全部為空，略過"),
                DateStrategy::Unparsed => {
                    warn!(column, non_empty, "日期欄無法解析，保留原值")
                }
                _ => info!(
                    column,
                    strategy = %strategy,
                    converted,
                    non_empty,
                    "日期欄轉換完成"
                ),
            }

            frame.replace_column(idx, normalized);
            reports.push(ColumnDateReport {
                column: column.to_string(),
                strategy,
                non_empty,
                converted,
            });
        }

        reports
    }

    /// 正規化單一欄位值
    ///
    /// 空值維持空值；解析成功者輸出 DateTime，其餘保留原值。
    pub fn normalize_column(&self, values: &[CellValue]) -> (Vec<CellValue>, DateStrategy) {
        let non_empty: Vec<&CellValue> = values.iter().filter(|v| !v.is_empty()).collect();
        if non_empty.is_empty() {
            return (values.to_vec(), DateStrategy::AllEmpty);
        }

        if non_empty.iter().all(|v| matches!(v, CellValue::DateTime(_))) {
            return (values.to_vec(), DateStrategy::Typed);
        }

        match self.variant {
            DateVariant::Standard => self.standard(values, &non_empty),
            DateVariant::SlashFirst => self.slash_first(values),
        }
    }

    fn standard(&self, values: &[CellValue], non_empty: &[&CellValue]) -> (Vec<CellValue>, DateStrategy) {
        // 數值欄：在有效範圍內視為序列號
        let all_numeric = non_empty.iter().all(|v| matches!(v, CellValue::Number(_)));
        if all_numeric
            && non_empty
                .iter()
                .any(|v| matches!(v, CellValue::Number(n) if is_serial_in_range(*n)))
        {
            let out = values
                .iter()
                .map(|v| match v {
                    CellValue::Number(n) if is_serial_in_range(*n) => excel_serial_to_datetime(*n)
                        .map(CellValue::DateTime)
                        .unwrap_or_else(|| v.clone()),
                    _ => v.clone(),
                })
                .collect();
            return (out, DateStrategy::Serial);
        }

        let cleaned: Vec<Option<String>> = values
            .iter()
            .map(|v| match v {
                CellValue::Text(_) | CellValue::Number(_) if !v.is_empty() => {
                    Some(strip_weekday(&v.to_text()))
                }
                _ => None,
            })
            .collect();

        for pattern in DATE_PATTERNS {
            let parsed: Vec<Option<NaiveDateTime>> = cleaned
                .iter()
                .map(|c| c.as_deref().and_then(|t| parse_with_pattern(t, pattern)))
                .collect();
            if parsed.iter().any(Option::is_some) {
                return (
                    merge_parsed(values, parsed),
                    DateStrategy::Pattern(pattern.to_string()),
                );
            }
        }

        let parsed: Vec<Option<NaiveDateTime>> = cleaned
            .iter()
            .map(|c| c.as_deref().and_then(parse_generic))
            .collect();
        if parsed.iter().any(Option::is_some) {
            return (merge_parsed(values, parsed), DateStrategy::Generic);
        }

        (values.to_vec(), DateStrategy::Unparsed)
    }

    fn slash_first(&self, values: &[CellValue]) -> (Vec<CellValue>, DateStrategy) {
        let texts: Vec<Option<String>> = values
            .iter()
            .map(|v| match v {
                CellValue::Text(_) | CellValue::Number(_) if !v.is_empty() => {
                    Some(v.to_text().trim().to_string())
                }
                _ => None,
            })
            .collect();

        let parsed: Vec<Option<NaiveDateTime>> = texts
            .iter()
            .map(|t| {
                t.as_deref()
                    .filter(|t| SLASH_DATE_RE.is_match(t))
                    .and_then(|t| parse_with_pattern(t, "%Y/%m/%d"))
            })
            .collect();
        if parsed.iter().any(Option::is_some) {
            return (merge_parsed(values, parsed), DateStrategy::SlashDate);
        }

        let parsed: Vec<Option<NaiveDateTime>> = texts
            .iter()
            .map(|t| t.as_deref().and_then(parse_generic))
            .collect();
        if parsed.iter().any(Option::is_some) {
            return (merge_parsed(values, parsed), DateStrategy::Generic);
        }

        (values.to_vec(), DateStrategy::Unparsed)
    }
}

fn merge_parsed(values: &[CellValue], parsed: Vec<Option<NaiveDateTime>>) -> Vec<CellValue> {
    values
        .iter()
        .zip(parsed)
        .map(|(v, p)| p.map(CellValue::DateTime).unwrap_or_else(|| v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn dt(y: i32, m: u32, d: u32) -> CellValue {
        CellValue::DateTime(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
    }

    #[test]
    fn test_serial_epoch() {
        let value = excel_serial_to_datetime(45000.0).unwrap();
        assert_eq!(value.format("%Y-%m-%d").to_string(), "2023-03-15");
        let noon = excel_serial_to_datetime(45000.5).unwrap();
        assert_eq!(noon.format("%H:%M:%S").to_string(), "12:00:00");
    }

    #[test]
    fn test_strip_weekday_variants() {
        assert_eq!(strip_weekday("2024/01/05(五)"), "2024/01/05");
        assert_eq!(strip_weekday("2024/01/05 （週五）"), "2024/01/05");
        assert_eq!(strip_weekday("2024/01/07(星期日)"), "2024/01/07");
        assert_eq!(strip_weekday("2024/01/05 (Fri)"), "2024/01/05");
    }

    #[test]
    fn test_standard_slash_pattern_with_weekday() {
        let normalizer = DateNormalizer::new(DateVariant::Standard);
        let (out, strategy) = normalizer.normalize_column(&[
            text("2024/01/05(五)"),
            CellValue::Empty,
            text("待確認"),
        ]);

        assert_eq!(strategy, DateStrategy::Pattern("%Y/%m/%d".to_string()));
        assert_eq!(out[0], dt(2024, 1, 5));
        assert_eq!(out[1], CellValue::Empty);
        assert_eq!(out[2], text("待確認"));
    }

    #[test]
    fn test_standard_serial_column() {
        let normalizer = DateNormalizer::default();
        let (out, strategy) =
            normalizer.normalize_column(&[CellValue::Number(45000.0), CellValue::Number(0.5)]);

        assert_eq!(strategy, DateStrategy::Serial);
        assert_eq!(out[0], dt(2023, 3, 15));
        assert_eq!(out[1], CellValue::Number(0.5));
    }

    #[test]
    fn test_compact_numeric_dates_use_pattern() {
        let normalizer = DateNormalizer::default();
        let (out, strategy) = normalizer.normalize_column(&[CellValue::Number(20240105.0)]);

        assert_eq!(strategy, DateStrategy::Pattern("%Y%m%d".to_string()));
        assert_eq!(out[0], dt(2024, 1, 5));
    }

    #[test]
    fn test_typed_column_kept() {
        let normalizer = DateNormalizer::default();
        let (out, strategy) = normalizer.normalize_column(&[dt(2024, 2, 1), CellValue::Empty]);
        assert_eq!(strategy, DateStrategy::Typed);
        assert_eq!(out[0], dt(2024, 2, 1));
    }

    #[test]
    fn test_unparsed_keeps_original() {
        let normalizer = DateNormalizer::default();
        let (out, strategy) = normalizer.normalize_column(&[text("未定"), text("N/A")]);
        assert_eq!(strategy, DateStrategy::Unparsed);
        assert_eq!(out[0], text("未定"));
    }

    #[test]
    fn test_slash_first_variant() {
        let normalizer = DateNormalizer::new(DateVariant::SlashFirst);
        let (out, strategy) =
            normalizer.normalize_column(&[text("2020/1/16"), text("2020-01-17")]);

        assert_eq!(strategy, DateStrategy::SlashDate);
        assert_eq!(out[0], dt(2020, 1, 16));
        assert_eq!(out[1], text("2020-01-17"));

        let (out, strategy) = normalizer.normalize_column(&[text("2020-01-17 08:30:00")]);
        assert_eq!(strategy, DateStrategy::Generic);
        assert!(matches!(out[0], CellValue::DateTime(_)));
    }

    #[test]
    fn test_normalize_frame_skips_missing_columns() {
        let mut frame = SourceFrame::new(
            "t",
            vec!["發貨日期".to_string()],
            vec![vec![text("2024-03-01")]],
        );
        let reports = DateNormalizer::default().normalize_frame(&mut frame, &["發貨日期", "單據日期"]);

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].converted, 1);
        assert_eq!(frame.cell(0, 0).to_text(), "2024-03-01 00:00:00");
    }
}
