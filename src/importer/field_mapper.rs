// ==========================================
// BI 資料匯入工具 - 欄位對應器（欄位對帳）
// ==========================================
// 職責: 來源欄名（標準名 / 同義名 / 佔位名 / 位置 / 子字串）
//       → 子系統標準欄位集合 + 文字清理
// 解析順序: 候選清單（依序；標準名預設為第一候選）→ 建立空欄（ColumnMappingGap）
// ==========================================

use crate::domain::frame::{CanonicalFrame, CellValue, ColumnDef, ColumnKind, FieldValue, SourceFrame};
use crate::importer::data_cleaner::{DataCleaner, NumericFallback};
use serde::Serialize;
use tracing::{debug, warn};

// ==========================================
// 規則定義
// ==========================================

/// 候選來源欄
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// 表頭完全相同（含 "Unnamed: N" 佔位名）
    Name(String),
    /// 絕對欄位位置（0 起算）
    Position(usize),
    /// 表頭包含子字串
    Contains(String),
}

impl Candidate {
    fn matches(&self, index: usize, header: &str) -> bool {
        match self {
            Candidate::Name(name) => header == name,
            Candidate::Position(pos) => index == *pos,
            Candidate::Contains(needle) => header.contains(needle.as_str()),
        }
    }
}

/// 單一標準欄位的對應規則
#[derive(Debug, Clone)]
pub struct ColumnRule {
    pub canonical: String,
    pub candidates: Vec<Candidate>,
    /// 逐列備援：解析後為空值時，依序取這些來源欄的非空值
    pub fill_from: Vec<String>,
}

impl ColumnRule {
    /// 以標準名本身為第一候選
    pub fn new(canonical: impl Into<String>) -> Self {
        let canonical = canonical.into();
        Self {
            candidates: vec![Candidate::Name(canonical.clone())],
            canonical,
            fill_from: Vec::new(),
        }
    }

    /// 不以標準名匹配，只用之後明列的候選
    pub fn matching(canonical: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
            candidates: Vec::new(),
            fill_from: Vec::new(),
        }
    }

    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.candidates.push(Candidate::Name(name.into()));
        self
    }

    pub fn position(mut self, index: usize) -> Self {
        self.candidates.push(Candidate::Position(index));
        self
    }

    pub fn contains(mut self, needle: impl Into<String>) -> Self {
        self.candidates.push(Candidate::Contains(needle.into()));
        self
    }

    pub fn fill_from(mut self, column: impl Into<String>) -> Self {
        self.fill_from.push(column.into());
        self
    }
}

/// 比對模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// 每個標準欄依序找第一個符合的來源欄
    #[default]
    PerCanonical,
    /// 有序規則表：每個來源欄指派給第一條符合的規則，
    /// 每個標準欄取第一個被指派的來源欄
    FirstRuleWins,
}

/// 數值欄位
#[derive(Debug, Clone)]
pub struct NumericColumn {
    pub name: String,
    pub fallback: NumericFallback,
}

/// 一個子系統資料表的完整對應規則
#[derive(Debug, Clone)]
pub struct ColumnRules {
    pub table: String,
    pub rules: Vec<ColumnRule>,
    pub mode: MatchMode,
    /// 未對應的來源欄附加在標準欄之後
    pub passthrough: bool,
    /// 移除數字間連字號的備註類欄位
    pub remark_columns: Vec<String>,
    pub numeric_columns: Vec<NumericColumn>,
}

impl ColumnRules {
    pub fn new(table: impl Into<String>, rules: Vec<ColumnRule>) -> Self {
        Self {
            table: table.into(),
            rules,
            mode: MatchMode::PerCanonical,
            passthrough: false,
            remark_columns: Vec::new(),
            numeric_columns: Vec::new(),
        }
    }

    /// 只有標準名的規則集合
    pub fn exact(table: impl Into<String>, columns: &[&str]) -> Self {
        Self::new(table, columns.iter().map(|c| ColumnRule::new(*c)).collect())
    }

    pub fn first_rule_wins(mut self) -> Self {
        self.mode = MatchMode::FirstRuleWins;
        self
    }

    pub fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    pub fn remarks(mut self, columns: &[&str]) -> Self {
        self.remark_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn numeric(mut self, column: &str, fallback: NumericFallback) -> Self {
        self.numeric_columns.push(NumericColumn {
            name: column.to_string(),
            fallback,
        });
        self
    }

    pub fn canonical_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.canonical.as_str()).collect()
    }
}

/// 對帳結果
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    pub source: String,
    pub table: String,
    /// (標準欄, 來源表頭)
    pub mapped: Vec<(String, String)>,
    /// 找不到來源欄、以空值建立的標準欄
    pub gaps: Vec<String>,
    pub passthrough: Vec<String>,
    pub rows: usize,
}

// ==========================================
// FieldMapper
// ==========================================
pub struct FieldMapper;

impl FieldMapper {
    /// 解析每個標準欄對應的來源欄索引
    pub fn resolve(&self, headers: &[String], rules: &ColumnRules) -> Vec<Option<usize>> {
        match rules.mode {
            MatchMode::PerCanonical => rules
                .rules
                .iter()
                .map(|rule| {
                    rule.candidates.iter().find_map(|cand| {
                        headers
                            .iter()
                            .enumerate()
                            .position(|(i, h)| cand.matches(i, h))
                    })
                })
                .collect(),
            MatchMode::FirstRuleWins => {
                let mut resolved = vec![None; rules.rules.len()];
                for (i, header) in headers.iter().enumerate() {
                    let assigned = rules
                        .rules
                        .iter()
                        .position(|rule| rule.candidates.iter().any(|c| c.matches(i, header)));
                    if let Some(rule_idx) = assigned {
                        if resolved[rule_idx].is_none() {
                            resolved[rule_idx] = Some(i);
                        }
                    }
                }
                resolved
            }
        }
    }

    /// 將單一來源資料框對帳為標準資料框
    pub fn reconcile(&self, frame: &SourceFrame, rules: &ColumnRules) -> (CanonicalFrame, ReconcileReport) {
        let cleaner = DataCleaner;
        let headers = frame.headers();
        let resolved = self.resolve(headers, rules);

        let mut report = ReconcileReport {
            source: frame.source().to_string(),
            table: rules.table.clone(),
            rows: frame.len(),
            ..Default::default()
        };

        // 輸出欄：標準欄 → (可選) 透傳欄
        let mut outputs: Vec<(String, Option<usize>, Vec<usize>)> = Vec::new();
        for (rule, idx) in rules.rules.iter().zip(&resolved) {
            match idx {
                Some(i) => report.mapped.push((rule.canonical.clone(), headers[*i].clone())),
                None => report.gaps.push(rule.canonical.clone()),
            }
            let fills = rule
                .fill_from
                .iter()
                .filter_map(|f| frame.column_index(f))
                .collect();
            outputs.push((rule.canonical.clone(), *idx, fills));
        }

        if rules.passthrough {
            for (i, header) in headers.iter().enumerate() {
                let duplicate = outputs.iter().any(|(name, _, _)| name == header);
                if !duplicate {
                    report.passthrough.push(header.clone());
                    outputs.push((header.clone(), Some(i), Vec::new()));
                }
            }
        }

        let columns: Vec<ColumnDef> = outputs
            .iter()
            .map(|(name, _, _)| ColumnDef {
                name: name.clone(),
                kind: if rules.numeric_columns.iter().any(|n| &n.name == name) {
                    ColumnKind::Real
                } else {
                    ColumnKind::Text
                },
            })
            .collect();

        let mut canonical = CanonicalFrame::new(columns);
        for row_idx in 0..frame.len() {
            let row = outputs
                .iter()
                .map(|(name, idx, fills)| {
                    if let Some(numeric) = rules.numeric_columns.iter().find(|n| &n.name == name) {
                        let cell = idx.map(|i| frame.cell(row_idx, i).clone()).unwrap_or(CellValue::Empty);
                        return cleaner.to_numeric(&cell, numeric.fallback);
                    }

                    let mut text = idx
                        .map(|i| self.clean_value(&cleaner, name, rules, &frame.cell(row_idx, i).to_text()))
                        .unwrap_or_default();
                    if text.is_empty() {
                        text = fills
                            .iter()
                            .map(|f| self.clean_value(&cleaner, name, rules, &frame.cell(row_idx, *f).to_text()))
                            .find(|v| !v.is_empty())
                            .unwrap_or_default();
                    }
                    FieldValue::Text(text)
                })
                .collect();
            canonical.push_row(row);
        }

        if !report.gaps.is_empty() {
            warn!(
                source = %report.source,
                table = %report.table,
                gaps = ?report.gaps,
                "來源缺少欄位，已建立空欄"
            );
        }
        debug!(
            source = %report.source,
            table = %report.table,
            mapped = report.mapped.len(),
            passthrough = report.passthrough.len(),
            rows = report.rows,
            "欄位對帳完成"
        );

        (canonical, report)
    }

    /// 逐一對帳多個來源後依欄名串接
    pub fn reconcile_all(
        &self,
        frames: &[SourceFrame],
        rules: &ColumnRules,
    ) -> (CanonicalFrame, Vec<ReconcileReport>) {
        let mut canonical = Vec::with_capacity(frames.len());
        let mut reports = Vec::with_capacity(frames.len());
        for frame in frames {
            let (c, r) = self.reconcile(frame, rules);
            canonical.push(c);
            reports.push(r);
        }

        let merged = if canonical.is_empty() {
            CanonicalFrame::with_text_columns(&rules.canonical_names())
        } else {
            CanonicalFrame::concat(canonical)
        };
        (merged, reports)
    }

    fn clean_value(&self, cleaner: &DataCleaner, column: &str, rules: &ColumnRules, raw: &str) -> String {
        if cleaner.is_phone_header(column) {
            cleaner.digits_only(raw)
        } else if rules.remark_columns.iter().any(|r| r == column) {
            cleaner.strip_digit_hyphens(raw)
        } else {
            cleaner.clean_text(raw)
        }
    }
}
