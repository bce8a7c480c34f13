// ==========================================
// BI 資料匯入工具 - 資料框架模型
// ==========================================
// SourceFrame: 來源試算表的原始列（欄名照上游原樣）
// CanonicalFrame: 各子系統固定欄位集合的標準化列
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue};
use serde::Serialize;

/// 空白表頭的位置佔位名稱前綴
pub const PLACEHOLDER_PREFIX: &str = "Unnamed: ";

/// 產生位置佔位欄名（0 起算）
pub fn placeholder_header(index: usize) -> String {
    format!("{}{}", PLACEHOLDER_PREFIX, index)
}

pub fn is_placeholder_header(header: &str) -> bool {
    header.starts_with(PLACEHOLDER_PREFIX)
}

/// 將整數值的浮點數輸出為整數文字（客戶代碼 "123.0" → "123"）
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

// ==========================================
// CellValue - 來源儲存格
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// 空值或全空白文字
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 轉為文字（原值保留，不做清理）
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// ==========================================
// SourceFrame - 來源資料框
// ==========================================
#[derive(Debug, Clone)]
pub struct SourceFrame {
    source: String,
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl SourceFrame {
    /// 建立資料框；每列長度補齊/截斷為表頭寬度
    pub fn new(source: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Self {
            source: source.into(),
            headers,
            rows,
        }
    }

    /// 來源名稱（檔名），用於日誌
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// 取出整欄（依列順序）
    pub fn column(&self, col: usize) -> Vec<CellValue> {
        self.rows
            .iter()
            .map(|r| r.get(col).cloned().unwrap_or(CellValue::Empty))
            .collect()
    }

    /// 以新值取代整欄；長度不足的部分視為空值
    pub fn replace_column(&mut self, col: usize, values: Vec<CellValue>) {
        if col >= self.width() {
            return;
        }
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row[col] = values.next().unwrap_or(CellValue::Empty);
        }
    }

    pub fn rename_header(&mut self, col: usize, name: impl Into<String>) {
        if let Some(h) = self.headers.get_mut(col) {
            *h = name.into();
        }
    }

    /// 移除整列皆空的資料列，回傳移除筆數
    pub fn drop_empty_rows(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| !row.iter().all(CellValue::is_empty));
        before - self.rows.len()
    }

    pub fn has_placeholder_headers(&self) -> bool {
        self.headers.iter().any(|h| is_placeholder_header(h))
    }
}

// ==========================================
// FieldValue - 標準化欄位值（寫入 SQLite）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// 文字表示；Null 視為空字串
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Real(r) => format_number(*r),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Null => ToSqlOutput::Owned(SqlValue::Null),
            FieldValue::Text(s) => ToSqlOutput::from(s.as_str()),
            FieldValue::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            FieldValue::Real(r) => ToSqlOutput::Owned(SqlValue::Real(*r)),
        })
    }
}

/// 欄位宣告型別（CREATE TABLE 用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
}

impl ColumnKind {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnDef {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Text,
        }
    }
}

pub type CanonicalRow = Vec<FieldValue>;

// ==========================================
// CanonicalFrame - 標準化資料框
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CanonicalFrame {
    columns: Vec<ColumnDef>,
    rows: Vec<CanonicalRow>,
}

impl CanonicalFrame {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// 全部為 TEXT 欄位的資料框
    pub fn with_text_columns<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(names.iter().map(|n| ColumnDef::text(n.as_ref())).collect())
    }

    pub fn from_parts(columns: Vec<ColumnDef>, rows: Vec<CanonicalRow>) -> Self {
        let mut frame = Self::new(columns);
        for row in rows {
            frame.push_row(row);
        }
        frame
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<CanonicalRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// 新增一列；長度補齊/截斷為欄位數
    pub fn push_row(&mut self, mut row: CanonicalRow) {
        row.resize(self.columns.len(), FieldValue::default());
        self.rows.push(row);
    }

    /// 讀取儲存格文字；欄位不存在時回傳空字串
    pub fn text(&self, row: usize, column: &str) -> String {
        self.column_index(column)
            .and_then(|c| self.rows.get(row).and_then(|r| r.get(c)))
            .map(FieldValue::as_text)
            .unwrap_or_default()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&FieldValue> {
        let c = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(c))
    }

    pub fn set_kind(&mut self, column: &str, kind: ColumnKind) {
        if let Some(c) = self.columns.iter_mut().find(|c| c.name == column) {
            c.kind = kind;
        }
    }

    /// 若欄位不存在則新增（以 default 填滿）
    pub fn ensure_column(&mut self, column: &str, default: FieldValue) {
        if self.has_column(column) {
            return;
        }
        self.columns.push(ColumnDef::text(column));
        for row in &mut self.rows {
            row.push(default.clone());
        }
    }

    /// 逐列套用轉換
    pub fn map_column<F>(&mut self, column: &str, mut f: F)
    where
        F: FnMut(&FieldValue) -> FieldValue,
    {
        if let Some(c) = self.column_index(column) {
            for row in &mut self.rows {
                row[c] = f(&row[c]);
            }
        }
    }

    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&CanonicalFrame, &CanonicalRow) -> bool,
    {
        let rows = std::mem::take(&mut self.rows);
        let kept = rows.into_iter().filter(|row| keep(self, row)).collect();
        self.rows = kept;
    }

    pub fn drop_columns<F>(&mut self, mut drop: F) -> Vec<String>
    where
        F: FnMut(&str) -> bool,
    {
        let keep: Vec<bool> = self.columns.iter().map(|c| !drop(&c.name)).collect();
        let dropped = self
            .columns
            .iter()
            .zip(&keep)
            .filter(|(_, k)| !**k)
            .map(|(c, _)| c.name.clone())
            .collect();

        let columns = std::mem::take(&mut self.columns);
        self.columns = columns
            .into_iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(c, _)| c)
            .collect();

        for row in &mut self.rows {
            let old = std::mem::take(row);
            *row = old
                .into_iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| v)
                .collect();
        }

        dropped
    }

    /// 投影 + 改名：(來源欄, 目標欄)；來源欄不存在時目標欄填空字串
    pub fn select(&self, mapping: &[(&str, &str)]) -> CanonicalFrame {
        let columns = mapping
            .iter()
            .map(|(src, dst)| ColumnDef {
                name: dst.to_string(),
                kind: self
                    .column_index(src)
                    .map(|i| self.columns[i].kind)
                    .unwrap_or(ColumnKind::Text),
            })
            .collect();
        let indices: Vec<Option<usize>> = mapping
            .iter()
            .map(|(src, _)| self.column_index(src))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|i| i.map(|i| row[i].clone()).unwrap_or_default())
                    .collect()
            })
            .collect();

        CanonicalFrame { columns, rows }
    }

    /// 依欄名串接多個資料框；欄位取聯集（首次出現順序），缺欄填空字串
    pub fn concat(frames: Vec<CanonicalFrame>) -> CanonicalFrame {
        let mut columns: Vec<ColumnDef> = Vec::new();
        for frame in &frames {
            for col in &frame.columns {
                if !columns.iter().any(|c| c.name == col.name) {
                    columns.push(col.clone());
                }
            }
        }

        let mut out = CanonicalFrame::new(columns);
        for frame in frames {
            let indices: Vec<Option<usize>> = out
                .columns
                .iter()
                .map(|c| frame.column_index(&c.name))
                .collect();
            for row in frame.rows {
                let aligned = indices
                    .iter()
                    .map(|i| i.map(|i| row[i].clone()).unwrap_or_default())
                    .collect();
                out.rows.push(aligned);
            }
        }
        out
    }
}
