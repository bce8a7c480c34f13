// ==========================================
// 分批寫入整合測試
// ==========================================

use bi_data_import::db::{count_rows, table_columns};
use bi_data_import::domain::frame::{CanonicalFrame, FieldValue};
use bi_data_import::repository::BatchLoader;
use rusqlite::Connection;
use tempfile::TempDir;

fn frame(rows: usize) -> CanonicalFrame {
    let mut frame = CanonicalFrame::with_text_columns(&["單據編號", "客戶名稱"]);
    for i in 0..rows {
        frame.push_row(vec![FieldValue::text(format!("S{:05}", i)), FieldValue::text("甲")]);
    }
    frame
}

#[test]
fn test_2500_rows_in_chunks_of_1000() {
    let dir = TempDir::new().unwrap();
    let mut conn = Connection::open(dir.path().join("sales.db")).unwrap();

    let report = BatchLoader::new(1000)
        .replace_table(&mut conn, "sales_main", &frame(2500), false)
        .unwrap();
    assert_eq!(report.chunks, 3);
    assert_eq!(report.rows_written, 2500);
    assert_eq!(count_rows(&conn, "sales_main").unwrap(), 2500);
}

#[test]
fn test_replace_drops_previous_rows() {
    let mut conn = Connection::open_in_memory().unwrap();
    let loader = BatchLoader::new(7);

    loader.replace_table(&mut conn, "repair_data", &frame(50), true).unwrap();
    loader.replace_table(&mut conn, "repair_data", &frame(13), true).unwrap();

    assert_eq!(count_rows(&conn, "repair_data").unwrap(), 13);
    assert_eq!(table_columns(&conn, "repair_data").unwrap()[0], "id");
}
