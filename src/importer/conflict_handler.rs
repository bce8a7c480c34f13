// ==========================================
// BI 資料匯入工具 - 重複單據處理器
// ==========================================
// 職責: 同一單據編號僅保留一列
// 規則: 名稱非空者優先；同等完整度取串接順序中第一筆
// 輸出順序: 各鍵首次出現的順序
// ==========================================

use crate::domain::frame::{CanonicalFrame, CanonicalRow};
use std::collections::HashMap;
use tracing::debug;

pub struct ConflictHandler;

impl ConflictHandler {
    /// 通用去重
    ///
    /// # 參數
    /// - key: 取出去重鍵
    /// - name: 取出名稱（判斷完整度）
    pub fn resolve<T, K, N>(&self, rows: Vec<T>, key: K, name: N) -> Vec<T>
    where
        K: Fn(&T) -> String,
        N: Fn(&T) -> String,
    {
        let mut slots: Vec<T> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in rows {
            let k = key(&row);
            match index.get(&k) {
                Some(&slot) => {
                    let kept_has_name = !name(&slots[slot]).trim().is_empty();
                    let new_has_name = !name(&row).trim().is_empty();
                    if !kept_has_name && new_has_name {
                        slots[slot] = row;
                    }
                }
                None => {
                    index.insert(k, slots.len());
                    slots.push(row);
                }
            }
        }

        slots
    }

    /// 依欄名對標準資料框去重
    pub fn dedup_frame(&self, frame: CanonicalFrame, key_column: &str, name_column: &str) -> CanonicalFrame {
        let key_idx = frame.column_index(key_column);
        let name_idx = frame.column_index(name_column);
        let Some(key_idx) = key_idx else {
            return frame;
        };

        let before = frame.len();
        let columns = frame.columns().to_vec();
        let rows = self.resolve(
            frame.into_rows(),
            |row: &CanonicalRow| row[key_idx].as_text(),
            |row: &CanonicalRow| name_idx.map(|i| row[i].as_text()).unwrap_or_default(),
        );

        debug!(
            key = key_column,
            before,
            after = rows.len(),
            "單據去重完成"
        );
        CanonicalFrame::from_parts(columns, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales(rows: &[(&str, &str)]) -> CanonicalFrame {
        let mut frame = CanonicalFrame::with_text_columns(&["單據編號", "客戶名稱"]);
        for (doc, name) in rows {
            frame.push_row(vec![(*doc).into(), (*name).into()]);
        }
        frame
    }

    #[test]
    fn test_named_row_wins_in_either_order() {
        let handler = ConflictHandler;
        for input in [
            sales(&[("A", ""), ("A", "Bob")]),
            sales(&[("A", "Bob"), ("A", "")]),
        ] {
            let out = handler.dedup_frame(input, "單據編號", "客戶名稱");
            assert_eq!(out.len(), 1);
            assert_eq!(out.text(0, "客戶名稱"), "Bob");
        }
    }

    #[test]
    fn test_first_occurrence_order_and_tie() {
        let handler = ConflictHandler;
        let out = handler.dedup_frame(
            sales(&[("B", "甲"), ("A", "乙"), ("B", "丙"), ("C", "")]),
            "單據編號",
            "客戶名稱",
        );

        assert_eq!(out.len(), 3);
        assert_eq!(out.text(0, "單據編號"), "B");
        assert_eq!(out.text(0, "客戶名稱"), "甲");
        assert_eq!(out.text(1, "單據編號"), "A");
        assert_eq!(out.text(2, "單據編號"), "C");
    }

    #[test]
    fn test_generic_resolve_on_tuples() {
        let rows = vec![("k1", ""), ("k2", "x"), ("k1", "y")];
        let out = ConflictHandler.resolve(rows, |r| r.0.to_string(), |r| r.1.to_string());
        assert_eq!(out, vec![("k1", "y"), ("k2", "x")]);
    }

    #[test]
    fn test_missing_key_column_is_noop() {
        let frame = sales(&[("A", ""), ("A", "")]);
        let out = ConflictHandler.dedup_frame(frame, "不存在", "客戶名稱");
        assert_eq!(out.len(), 2);
    }
}
