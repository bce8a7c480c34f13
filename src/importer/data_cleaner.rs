// ==========================================
// BI 資料匯入工具 - 資料清洗器實作
// ==========================================
// 職責: 文字清理 / 電話欄位數字化 / 備註連字號移除 / 數值解析
// ==========================================

use crate::domain::frame::{CellValue, FieldValue};

/// 電話類欄位判定關鍵字（表頭包含任一即視為電話欄）
pub const PHONE_KEYWORDS: [&str; 6] = ["電話", "手機", "Phone", "phone", "TEL", "tel"];

/// 數值欄位無法解析時的處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericFallback {
    /// 保留清理後文字（空值寫入 NULL）
    #[default]
    KeepText,
    /// 一律寫入 0
    Zero,
}

pub struct DataCleaner;

impl DataCleaner {
    /// 去除前後空白；"nan" / "None" 視為空字串
    pub fn clean_text(&self, value: &str) -> String {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("nan") || trimmed.eq_ignore_ascii_case("none") {
            String::new()
        } else {
            trimmed.to_string()
        }
    }

    /// 儲存格 → 清理後文字
    pub fn clean_cell(&self, cell: &CellValue) -> String {
        self.clean_text(&cell.to_text())
    }

    pub fn is_phone_header(&self, header: &str) -> bool {
        PHONE_KEYWORDS.iter().any(|k| header.contains(k))
    }

    /// 電話值僅保留數字
    pub fn digits_only(&self, value: &str) -> String {
        self.clean_text(value)
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect()
    }

    /// 移除兩側皆為數字的連字號（備註中的電話 0912-345-678）
    pub fn strip_digit_hyphens(&self, value: &str) -> String {
        let cleaned = self.clean_text(value);
        let chars: Vec<char> = cleaned.chars().collect();
        let mut out = String::with_capacity(cleaned.len());

        for (i, c) in chars.iter().enumerate() {
            if *c == '-'
                && i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())
            {
                continue;
            }
            out.push(*c);
        }
        out
    }

    /// 解析數值文字（容許千分位逗號）
    pub fn parse_number(&self, value: &str) -> Option<f64> {
        let text: String = self.clean_text(value).chars().filter(|c| *c != ',').collect();
        if text.is_empty() {
            return None;
        }
        text.parse::<f64>().ok().filter(|n| n.is_finite())
    }

    /// 數值欄位轉換
    pub fn to_numeric(&self, cell: &CellValue, fallback: NumericFallback) -> FieldValue {
        let parsed = match cell {
            CellValue::Number(n) => Some(*n),
            other => self.parse_number(&other.to_text()),
        };

        match (parsed, fallback) {
            (Some(n), _) => FieldValue::Real(n),
            (None, NumericFallback::Zero) => FieldValue::Real(0.0),
            (None, NumericFallback::KeepText) => {
                let text = self.clean_cell(cell);
                if text.is_empty() {
                    FieldValue::Null
                } else {
                    FieldValue::Text(text)
                }
            }
        }
    }

    /// 數量欄位：整數；小數文字截斷；無法解析 → 0
    pub fn to_quantity(&self, cell: &CellValue) -> i64 {
        match cell {
            CellValue::Number(n) if n.is_finite() => n.trunc() as i64,
            other => {
                let text = self.clean_text(&other.to_text());
                text.parse::<i64>()
                    .ok()
                    .or_else(|| self.parse_number(&text).map(|n| n.trunc() as i64))
                    .unwrap_or(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_artifacts() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("  nan "), "");
        assert_eq!(cleaner.clean_text("None"), "");
        assert_eq!(cleaner.clean_text("  台北市 "), "台北市");
    }

    #[test]
    fn test_phone_digits_only() {
        let cleaner = DataCleaner;
        assert!(cleaner.is_phone_header("聯絡電話"));
        assert!(cleaner.is_phone_header("行動手機"));
        assert!(!cleaner.is_phone_header("客戶名稱"));
        assert_eq!(cleaner.digits_only("(02) 2345-6789 #12"), "022345678912");
    }

    #[test]
    fn test_strip_digit_hyphens_only_between_digits() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.strip_digit_hyphens("電話 0912-345-678"), "電話 0912345678");
        assert_eq!(cleaner.strip_digit_hyphens("A-B 區 - 3樓"), "A-B 區 - 3樓");
        assert_eq!(cleaner.strip_digit_hyphens("-5"), "-5");
    }

    #[test]
    fn test_numeric_fallbacks() {
        let cleaner = DataCleaner;
        assert_eq!(
            cleaner.to_numeric(&CellValue::Text("1,234.5".into()), NumericFallback::Zero),
            FieldValue::Real(1234.5)
        );
        assert_eq!(
            cleaner.to_numeric(&CellValue::Text("N/A".into()), NumericFallback::Zero),
            FieldValue::Real(0.0)
        );
        assert_eq!(
            cleaner.to_numeric(&CellValue::Empty, NumericFallback::KeepText),
            FieldValue::Null
        );
    }

    #[test]
    fn test_quantity_parsing() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.to_quantity(&CellValue::Number(12.0)), 12);
        assert_eq!(cleaner.to_quantity(&CellValue::Text("7.9".into())), 7);
        assert_eq!(cleaner.to_quantity(&CellValue::Text("abc".into())), 0);
        assert_eq!(cleaner.to_quantity(&CellValue::Empty), 0);
    }
}
