// ==========================================
// BI 資料匯入工具 - 增量合併引擎（採購到貨進度）
// ==========================================
// 職責: 以 (po_number, item_serial_number) 合併匯入列
// 狀態: Missing → Inserted / Present → Updated / Malformed → Skipped / 例外 → Errored
// 紅線: 作業欄位只在新增時初始化，更新永不觸碰
// ==========================================

use crate::domain::procurement::{KeyState, ProcurementImportRow, UpsertOutcome, UpsertTally};
use crate::importer::error::ImportResult;
use crate::repository::ProcurementRepository;
use rusqlite::Connection;
use tracing::{info, warn};

pub struct UpsertEngine;

impl UpsertEngine {
    /// 查詢匯入列在資料庫中的狀態
    pub fn key_state(&self, conn: &Connection, row: &ProcurementImportRow) -> ImportResult<KeyState> {
        let Some(key) = row.key() else {
            return Ok(KeyState::Malformed);
        };
        let found = ProcurementRepository::find_key(conn, &key.po_number, &key.item_serial_number)?;
        Ok(match found {
            Some(id) => KeyState::Present(id),
            None => KeyState::Missing,
        })
    }

    /// 處理單列；錯誤只影響此列
    pub fn upsert_row(&self, conn: &Connection, row: &ProcurementImportRow) -> UpsertOutcome {
        let result = self.key_state(conn, row).and_then(|state| {
            Ok(match state {
                KeyState::Malformed => UpsertOutcome::Skipped,
                KeyState::Missing => {
                    ProcurementRepository::insert_item(conn, row)?;
                    UpsertOutcome::Inserted
                }
                KeyState::Present(id) => {
                    ProcurementRepository::update_authoritative(conn, id, row)?;
                    UpsertOutcome::Updated
                }
            })
        });

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    row = row.row_number,
                    po_number = %row.po_number,
                    item_serial_number = %row.item_serial_number,
                    error = %e,
                    "資料列處理失敗，已略過"
                );
                UpsertOutcome::Errored(e.to_string())
            }
        }
    }

    /// 補齊結構後，在單一交易內合併全部匯入列
    ///
    /// # 錯誤
    /// 只有結構補齊、開始交易或提交失敗會傳回錯誤；單列失敗計入 errored
    pub fn run(&self, conn: &mut Connection, rows: &[ProcurementImportRow]) -> ImportResult<UpsertTally> {
        ProcurementRepository::ensure_schema(conn)?;

        let tx = conn.transaction()?;
        let mut tally = UpsertTally::default();
        for row in rows {
            let outcome = self.upsert_row(&tx, row);
            tally.record(&outcome);
        }
        tx.commit()?;

        info!(
            inserted = tally.inserted,
            updated = tally.updated,
            skipped = tally.skipped,
            errored = tally.errored,
            "採購資料合併完成"
        );
        Ok(tally)
    }
}
