// ==========================================
// BI 資料匯入工具 - CRM 記事
// ==========================================
// 保留全部欄位；空白表頭改名為 欄位_<n>
// ==========================================

use crate::config::ImportConfig;
use crate::domain::frame::{is_placeholder_header, SourceFrame};
use crate::domain::types::Subsystem;
use crate::engine::subsystems::sources::load_single;
use crate::engine::subsystems::{open_store, write_table, ConversionReport, SubsystemConversion};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::{ColumnRules, FieldMapper};
use crate::importer::importer_trait::SheetSpec;
use tracing::{info, instrument};

pub const SOURCE_FILE: &str = "CRM記事.xlsx";
pub const TABLE: &str = "crm_notes";

/// 空白表頭 → 欄位_<n>（n 由 1 起算）
pub fn name_blank_headers(frame: &mut SourceFrame) -> usize {
    let blanks: Vec<usize> = frame
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, h)| h.trim().is_empty() || is_placeholder_header(h))
        .map(|(i, _)| i)
        .collect();
    for i in &blanks {
        frame.rename_header(*i, format!("欄位_{}", i + 1));
    }
    blanks.len()
}

pub struct CrmNotesConversion;

impl SubsystemConversion for CrmNotesConversion {
    fn subsystem(&self) -> Subsystem {
        Subsystem::CrmNotes
    }

    #[instrument(skip_all, name = "crm_notes")]
    fn convert(&self, config: &ImportConfig) -> ImportResult<ConversionReport> {
        let store = config.store_for(Subsystem::CrmNotes);
        let mut report = ConversionReport::new(Subsystem::CrmNotes, store);

        let mut source = load_single(config, SOURCE_FILE, &SheetSpec::first(), &mut report)?;
        let renamed = name_blank_headers(&mut source);
        let dropped = source.drop_empty_rows();
        info!(renamed, dropped, rows = source.len(), "CRM 記事整理完成");

        let (frame, reconcile) = FieldMapper.reconcile(&source, &ColumnRules::new(TABLE, Vec::new()).passthrough());
        report.reconcile.push(reconcile);

        let mut conn = open_store(store)?;
        write_table(&mut conn, config, TABLE, &frame, false, &[], &mut report)?;

        info!(rows = frame.len(), "CRM 記事寫入完成");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::{placeholder_header, CellValue};

    #[test]
    fn test_name_blank_headers() {
        let mut frame = SourceFrame::new(
            "CRM記事.xlsx",
            vec!["日期".into(), placeholder_header(1), "內容".into()],
            vec![vec![CellValue::Empty; 3]],
        );
        assert_eq!(name_blank_headers(&mut frame), 1);
        assert_eq!(frame.headers(), &["日期", "欄位_2", "內容"]);
    }
}
