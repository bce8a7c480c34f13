// ==========================================
// 子系統轉換整合測試
// ==========================================
// 測試目標: 以真實 .xlsx 來源走完 讀取 → 對帳 → 去重 → 寫入 → 索引
// ==========================================

mod test_helpers;

use bi_data_import::domain::types::Subsystem;
use bi_data_import::engine::subsystems::{
    CustodyConversion, CustomerConversion, InventoryConversion, SalesAiConversion,
    SalesConversion, ServiceCardConversion, SubsystemConversion,
};
use bi_data_import::logging;
use rusqlite::Connection;
use std::path::Path;
use test_helpers::{header_row, Cell, TestRoot};

fn texts(store: &Path, table: &str, column: &str) -> Vec<String> {
    let conn = Connection::open(store).unwrap();
    let sql = format!("SELECT CAST(\"{}\" AS TEXT) FROM \"{}\" ORDER BY rowid", column, table);
    let mut stmt = conn.prepare(&sql).unwrap();
    stmt.query_map([], |row| Ok(row.get::<_, Option<String>>(0)?.unwrap_or_default()))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn index_names(store: &Path, table: &str) -> Vec<String> {
    let conn = Connection::open(store).unwrap();
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1 AND sql IS NOT NULL")
        .unwrap();
    stmt.query_map([table], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_sales_dedup_prefers_named_row() {
    logging::init_test();
    let root = TestRoot::new();
    root.write_source(
        "發貨狀況分析表.xlsx",
        &["單據編號", "發貨日期", "客戶名稱", "聯絡電話", "產品名稱", "交易數量"],
        &[
            vec![Cell::S("S1"), Cell::S("2024/03/05"), Cell::Blank, Cell::S("02-2345-6789"), Cell::S("冷氣"), Cell::N(1.0)],
            vec![Cell::S("S1"), Cell::S("2024/03/05"), Cell::S("王小明"), Cell::Blank, Cell::S("濾網"), Cell::N(2.0)],
            vec![Cell::S("S2"), Cell::S("2024/03/06"), Cell::S("乙公司"), Cell::Blank, Cell::S("冷氣"), Cell::S("n/a")],
        ],
    );

    let report = SalesConversion.convert(&root.config).unwrap();
    assert_eq!(report.missing_sources, vec!["昇峰銷售資料.xlsx".to_string()]);
    assert!(report.mapping_gaps().iter().any(|g| g.ends_with("送貨地址")));

    let store = root.config.store_for(Subsystem::Sales);
    assert_eq!(texts(store, "sales_main", "單據編號"), vec!["S1", "S2"]);
    assert_eq!(texts(store, "sales_main", "客戶名稱"), vec!["王小明", "乙公司"]);
    assert_eq!(texts(store, "sales_main", "發貨日期")[0], "2024-03-05 00:00:00");
    assert_eq!(texts(store, "sales_main", "送貨地址"), vec!["", ""]);
    assert_eq!(texts(store, "sales_detail", "產品名稱").len(), 3);
    assert!(index_names(store, "sales_main").contains(&"idx_sales_main_doc_no".to_string()));
}

#[test]
fn test_sales_without_any_source_fails() {
    let root = TestRoot::new();
    assert!(SalesConversion.convert(&root.config).is_err());
    assert!(!root.config.store_for(Subsystem::Sales).exists());
}

#[test]
fn test_sales_ai_keeps_every_row() {
    let root = TestRoot::new();
    root.write_source(
        "昇峰銷售資料.xlsx",
        &["單據編號", "客戶", "交易價", "單據日期"],
        &[
            vec![Cell::S("T1"), Cell::S("甲"), Cell::S("1,200"), Cell::S("2024/01/02")],
            vec![Cell::S("T1"), Cell::S("甲"), Cell::S("-"), Cell::S("2024/01/02")],
        ],
    );

    SalesAiConversion.convert(&root.config).unwrap();
    let store = root.config.store_for(Subsystem::SalesAi);
    assert_eq!(texts(store, "sales_data", "客戶名稱"), vec!["甲", "甲"]);
    assert_eq!(texts(store, "sales_data", "單據日期")[0], "2024-01-02 00:00:00");

    let conn = Connection::open(store).unwrap();
    let prices: Vec<f64> = conn
        .prepare("SELECT \"交易價\" FROM sales_data ORDER BY rowid")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(prices, vec![1200.0, 0.0]);
}

#[test]
fn test_custody_name_fallback_chain() {
    let root = TestRoot::new();
    root.write_source(
        "寄倉資料.xlsx",
        &["單據編號", "借貨對象", "借貨對象名稱", "寄貨對象名稱", "產品名稱", "倉庫確認數量"],
        &[
            vec![Cell::S("C1"), Cell::S("K01"), Cell::Blank, Cell::S("丙商行"), Cell::S("冷氣"), Cell::N(3.0)],
            vec![Cell::S("C2"), Cell::S("K02"), Cell::S("丁公司"), Cell::Blank, Cell::S("濾網"), Cell::N(1.0)],
        ],
    );

    CustodyConversion.convert(&root.config).unwrap();
    let store = root.config.store_for(Subsystem::Custody);
    assert_eq!(texts(store, "custody_main", "客戶代碼"), vec!["K01", "K02"]);
    assert_eq!(texts(store, "custody_main", "客戶名稱"), vec!["丙商行", "丁公司"]);
    assert_eq!(texts(store, "custody_detail", "單據編號").len(), 2);
}

#[test]
fn test_customer_banner_rows_filtered_and_store_rebuilt() {
    let root = TestRoot::new();
    let store = root.config.store_for(Subsystem::Customer).to_path_buf();
    std::fs::write(&store, b"stale").unwrap();

    // 首列空白 → 表頭全為佔位名
    root.write_source_sheets(
        "客戶資料.xlsx",
        &[vec![
            vec![],
            vec![Cell::S("客戶資料")],
            vec![Cell::S("代碼"), Cell::S("郵遞區號"), Cell::S("地址"), Cell::S("名稱")],
            vec![
                Cell::N(1203.0),
                Cell::N(100.0),
                Cell::S("台北市中正區"),
                Cell::S("甲公司"),
                Cell::Blank,
                Cell::Blank,
                Cell::Blank,
                Cell::Blank,
                Cell::Blank,
                Cell::S("王先生"),
                Cell::S("(02) 2345-6789"),
            ],
        ]],
    );

    let report = CustomerConversion.convert(&root.config).unwrap();
    assert_eq!(report.rows_written(), 1);
    assert_eq!(texts(&store, "customer_basic", "客戶代碼"), vec!["1203"]);
    assert_eq!(texts(&store, "customer_basic", "聯絡電話"), vec!["0223456789"]);
    assert_eq!(texts(&store, "customer_contacts", "客戶代碼").len(), 0);
}

#[test]
fn test_inventory_rule_table_and_labels() {
    let root = TestRoot::new();
    root.write_source(
        "正航庫存資料.xlsx",
        &["產品代碼", "產品名稱", "倉庫名稱", "倉庫往來對象名稱", "存貨屬性", "庫存數量"],
        &[
            vec![Cell::S("A-01"), Cell::S("冷氣"), Cell::S("台北倉"), Cell::S("甲"), Cell::S("借入庫存"), Cell::N(5.0)],
            vec![Cell::S("A-02"), Cell::S("濾網"), Cell::S("台中倉"), Cell::Blank, Cell::S("自有"), Cell::S("n/a")],
        ],
    );

    InventoryConversion.convert(&root.config).unwrap();
    let store = root.config.store_for(Subsystem::Inventory);
    assert_eq!(texts(store, "inventory_data", "product_code"), vec!["A-01", "A-02"]);
    assert_eq!(texts(store, "inventory_data", "warehouse_partner_name"), vec!["甲", ""]);
    assert_eq!(texts(store, "inventory_data", "inventory_type"), vec!["寄倉", "世磊"]);
    assert_eq!(texts(store, "inventory_data", "id"), vec!["1", "2"]);

    let indexes = index_names(store, "inventory_data");
    assert!(indexes.contains(&"idx_product_warehouse".to_string()));
    assert!(indexes.contains(&"idx_warehouse_partner".to_string()));
}

#[test]
fn test_service_card_main_and_detail() {
    let root = TestRoot::new();
    let mut main_header = Vec::new();
    for name in [
        "登記號", "組織", "代碼", "名稱", "聯絡人", "電話", "地址", "型號", "序號",
        "項目", "人員", "登記日", "服務日", "完成日", "狀態", "備註", "保固", "位置",
    ] {
        main_header.push(Cell::S(name));
    }
    let mut main_row = vec![Cell::Blank; 18];
    main_row[0] = Cell::S("SC-1");
    main_row[3] = Cell::S("甲公司");
    main_row[11] = Cell::S("2024-01-02");
    main_row[15] = Cell::S("請撥 0912-345-678");

    root.write_source_sheets(
        "服務登記卡.xlsx",
        &[
            vec![vec![Cell::S("服務登記卡")], vec![Cell::S("列印日期")], main_header, main_row],
            vec![
                vec![Cell::S("耗材明細")],
                vec![Cell::S("列印日期")],
                header_row(&["服務登記卡號", "品名", "上次更換"]),
                vec![Cell::S("SC-1"), Cell::S("濾心"), Cell::N(45356.0)],
            ],
        ],
    );

    let report = ServiceCardConversion.convert(&root.config).unwrap();
    assert_eq!(report.tables.len(), 2);

    let store = root.config.store_for(Subsystem::ServiceCard);
    assert_eq!(texts(store, "service_card_data", "服務登記號"), vec!["SC-1"]);
    assert_eq!(texts(store, "service_card_data", "登記日期"), vec!["2024-01-02 00:00:00"]);
    assert_eq!(texts(store, "service_card_data", "備註"), vec!["請撥 0912345678"]);
    assert_eq!(texts(store, "service_card_detail", "服務登記號"), vec!["SC-1"]);
    assert_eq!(texts(store, "service_card_detail", "產品名稱"), vec!["濾心"]);
    assert_eq!(texts(store, "service_card_detail", "上次更換"), vec!["2024/03/05"]);
}

#[test]
fn test_service_card_detail_failure_keeps_main() {
    let root = TestRoot::new();
    root.write_source_sheets(
        "服務登記卡.xlsx",
        &[vec![
            vec![Cell::S("服務登記卡")],
            vec![Cell::S("列印日期")],
            header_row(&["服務登記號", "客戶名稱"]),
            vec![Cell::S("SC-9"), Cell::S("乙")],
        ]],
    );

    let report = ServiceCardConversion.convert(&root.config).unwrap();
    assert_eq!(report.tables.len(), 1);
    assert_eq!(texts(root.config.store_for(Subsystem::ServiceCard), "service_card_data", "客戶名稱"), vec!["乙"]);
}
