// ==========================================
// 測試輔助函式
// ==========================================
// 職責: 暫存資料根目錄、以 rust_xlsxwriter 產生真實 .xlsx 來源檔
// ==========================================

#![allow(dead_code)]

use bi_data_import::config::ImportConfig;
use rust_xlsxwriter::{Workbook, XlsxError};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 測試用儲存格
#[derive(Debug, Clone)]
pub enum Cell {
    S(&'static str),
    N(f64),
    Blank,
}

/// 暫存資料根目錄（需保持存活）
pub struct TestRoot {
    pub dir: TempDir,
    pub config: ImportConfig,
}

impl TestRoot {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("建立暫存目錄失敗");
        let config = ImportConfig::from_root(dir.path());
        config.ensure_dirs().expect("建立目錄失敗");
        Self { dir, config }
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.config = self.config.clone().with_chunk_size(size).expect("chunk size");
        self
    }

    pub fn source(&self, name: &str) -> PathBuf {
        self.config.source_path(name)
    }

    /// 在來源目錄寫入單頁活頁簿（首列為表頭）
    pub fn write_source(&self, name: &str, headers: &[&str], rows: &[Vec<Cell>]) {
        write_table(&self.source(name), headers, rows).expect("寫入來源檔失敗");
    }

    /// 在來源目錄寫入多頁活頁簿（每頁為原始格線）
    pub fn write_source_sheets(&self, name: &str, sheets: &[Vec<Vec<Cell>>]) {
        write_workbook(&self.source(name), sheets).expect("寫入來源檔失敗");
    }
}

pub fn header_row(headers: &[&'static str]) -> Vec<Cell> {
    headers.iter().map(|h| Cell::S(h)).collect()
}

pub fn write_table(path: &Path, headers: &[&str], rows: &[Vec<Cell>]) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (c, header) in headers.iter().enumerate() {
        sheet.write_string(0, c as u16, *header)?;
    }
    for (r, row) in rows.iter().enumerate() {
        write_row(sheet, (r + 1) as u32, row)?;
    }
    workbook.save(path)
}

pub fn write_workbook(path: &Path, sheets: &[Vec<Vec<Cell>>]) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    for grid in sheets {
        let sheet = workbook.add_worksheet();
        for (r, row) in grid.iter().enumerate() {
            write_row(sheet, r as u32, row)?;
        }
    }
    workbook.save(path)
}

fn write_row(sheet: &mut rust_xlsxwriter::Worksheet, row: u32, cells: &[Cell]) -> Result<(), XlsxError> {
    for (c, cell) in cells.iter().enumerate() {
        match cell {
            Cell::S(s) => {
                sheet.write_string(row, c as u16, *s)?;
            }
            Cell::N(n) => {
                sheet.write_number(row, c as u16, *n)?;
            }
            Cell::Blank => {}
        }
    }
    Ok(())
}
