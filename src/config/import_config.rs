// ==========================================
// BI 資料匯入工具 - 匯入設定
// ==========================================
// 層級: 內建預設（相對資料根目錄）→ TOML 設定檔 → 命令列 / 環境變數
// 建立一次後不可變，傳給每個子系統轉換
// ==========================================

use crate::config::config_file::{ConfigFile, StoreOverrides, CONFIG_FILE_NAME};
use crate::domain::types::Subsystem;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::DEFAULT_CHUNK_SIZE;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 資料根目錄環境變數
pub const ROOT_ENV: &str = "BI_IMPORT_ROOT";

/// 來源目錄預設名稱
pub const DEFAULT_SOURCE_DIR: &str = "資料來源";

/// 內建庫存屬性顯示名稱
pub const DEFAULT_INVENTORY_LABELS: [(&str, &str); 6] = [
    ("自有庫存", "世磊"),
    ("借入庫存", "寄倉"),
    ("借出庫存", "借出"),
    ("自有", "世磊"),
    ("借入", "寄倉"),
    ("借出", "借出"),
];

/// 各區域資料庫檔案
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorePaths {
    pub sales: PathBuf,
    pub repair: PathBuf,
    pub custody: PathBuf,
    pub customer: PathBuf,
    pub service_card: PathBuf,
    pub inventory: PathBuf,
    pub procurement: PathBuf,
    pub crm_notes: PathBuf,
    pub sales_ai: PathBuf,
}

impl StorePaths {
    /// 下游查詢系統約定的目錄結構
    pub fn under(root: &Path) -> Self {
        let sales_db = root.join("Sales_information_inquiry").join("database");
        Self {
            sales: sales_db.join("sales.db"),
            repair: sales_db.join("repair.db"),
            custody: sales_db.join("custody.db"),
            customer: sales_db.join("customer_new.db"),
            service_card: sales_db.join("service_card.db"),
            inventory: root
                .join("Inventory_inquiry_system")
                .join("database")
                .join("inventory_data.db"),
            procurement: root.join("ProcureTrack").join("database").join("procure.db"),
            crm_notes: root.join("CRM").join("CRM記事.db"),
            sales_ai: root.join("ai_assistant").join("database").join("sales_ai.db"),
        }
    }

    fn apply(&mut self, root: &Path, overrides: &StoreOverrides) {
        let pick = |current: &mut PathBuf, value: &Option<PathBuf>| {
            if let Some(path) = value {
                *current = resolve(root, path);
            }
        };
        pick(&mut self.sales, &overrides.sales);
        pick(&mut self.repair, &overrides.repair);
        pick(&mut self.custody, &overrides.custody);
        pick(&mut self.customer, &overrides.customer);
        pick(&mut self.service_card, &overrides.service_card);
        pick(&mut self.inventory, &overrides.inventory);
        pick(&mut self.procurement, &overrides.procurement);
        pick(&mut self.crm_notes, &overrides.crm_notes);
        pick(&mut self.sales_ai, &overrides.sales_ai);
    }

    pub fn all(&self) -> [&Path; 9] {
        [
            &self.sales,
            &self.repair,
            &self.custody,
            &self.customer,
            &self.service_card,
            &self.inventory,
            &self.procurement,
            &self.crm_notes,
            &self.sales_ai,
        ]
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// 匯入設定
#[derive(Debug, Clone, Serialize)]
pub struct ImportConfig {
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub stores: StorePaths,
    pub chunk_size: usize,
    pub inventory_attribute_labels: BTreeMap<String, String>,
}

impl ImportConfig {
    /// 只用內建預設
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            source_dir: root.join(DEFAULT_SOURCE_DIR),
            stores: StorePaths::under(&root),
            chunk_size: DEFAULT_CHUNK_SIZE,
            inventory_attribute_labels: DEFAULT_INVENTORY_LABELS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            root,
        }
    }

    /// 疊加設定檔
    ///
    /// # 參數
    /// - root: 資料根目錄
    /// - config_path: 指定設定檔；None 時依序嘗試 `<root>/bi-import.toml`、
    ///   使用者設定目錄下的 `bi-data-import/bi-import.toml`
    pub fn load(root: impl Into<PathBuf>, config_path: Option<&Path>) -> ImportResult<Self> {
        let mut config = Self::from_root(root);

        let path = match config_path {
            Some(p) => {
                if !p.exists() {
                    return Err(ImportError::ConfigReadError {
                        path: p.display().to_string(),
                        message: "設定檔不存在".to_string(),
                    });
                }
                Some(p.to_path_buf())
            }
            None => Self::discover(&config.root),
        };

        if let Some(path) = path {
            info!(path = %path.display(), "載入設定檔");
            let file = ConfigFile::load(&path)?;
            config.apply(file)?;
        } else {
            debug!("未找到設定檔，使用內建預設");
        }
        Ok(config)
    }

    fn discover(root: &Path) -> Option<PathBuf> {
        let local = root.join(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|d| d.join("bi-data-import").join(CONFIG_FILE_NAME))
            .filter(|p| p.exists())
    }

    fn apply(&mut self, file: ConfigFile) -> ImportResult<()> {
        if let Some(dir) = &file.source_dir {
            self.source_dir = resolve(&self.root, dir);
        }
        if let Some(size) = file.chunk_size {
            self.chunk_size = validate_chunk_size(size)?;
        }
        self.stores.apply(&self.root, &file.stores);
        if let Some(labels) = file.inventory_attribute_labels {
            self.inventory_attribute_labels = labels;
        }
        Ok(())
    }

    /// 命令列覆寫每批筆數
    pub fn with_chunk_size(mut self, size: usize) -> ImportResult<Self> {
        self.chunk_size = validate_chunk_size(size)?;
        Ok(self)
    }

    pub fn source_path(&self, file_name: &str) -> PathBuf {
        self.source_dir.join(file_name)
    }

    /// 子系統的輸出資料庫
    pub fn store_for(&self, subsystem: Subsystem) -> &Path {
        match subsystem {
            Subsystem::Customer => &self.stores.customer,
            Subsystem::Sales => &self.stores.sales,
            Subsystem::Repair => &self.stores.repair,
            Subsystem::Custody => &self.stores.custody,
            Subsystem::ServiceCard => &self.stores.service_card,
            Subsystem::CrmNotes => &self.stores.crm_notes,
            Subsystem::SalesAi => &self.stores.sales_ai,
            Subsystem::Procurement => &self.stores.procurement,
            Subsystem::Inventory => &self.stores.inventory,
        }
    }

    /// 建立來源目錄與所有資料庫所在目錄
    pub fn ensure_dirs(&self) -> ImportResult<()> {
        std::fs::create_dir_all(&self.source_dir)?;
        for store in self.stores.all() {
            if let Some(parent) = store.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

fn validate_chunk_size(size: usize) -> ImportResult<usize> {
    if size == 0 {
        return Err(ImportError::ConfigValueError {
            key: "chunk_size".to_string(),
            value: size.to_string(),
            message: "必須大於 0".to_string(),
        });
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_layout() {
        let config = ImportConfig::from_root("/data");
        assert_eq!(config.source_dir, PathBuf::from("/data/資料來源"));
        assert_eq!(
            config.store_for(Subsystem::Procurement),
            Path::new("/data/ProcureTrack/database/procure.db")
        );
        assert_eq!(
            config.store_for(Subsystem::CrmNotes),
            Path::new("/data/CRM/CRM記事.db")
        );
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.inventory_attribute_labels.get("借入").map(String::as_str), Some("寄倉"));
    }

    #[test]
    fn test_load_overlays_root_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "source_dir = \"in\"\nchunk_size = 250\n[stores]\nsales = \"/abs/sales.db\"\n",
        )
        .unwrap();

        let config = ImportConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.source_dir, dir.path().join("in"));
        assert_eq!(config.chunk_size, 250);
        assert_eq!(config.stores.sales, PathBuf::from("/abs/sales.db"));
        assert_eq!(config.stores.repair, StorePaths::under(dir.path()).repair);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = ImportConfig::load(dir.path(), Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ImportError::ConfigReadError { .. })));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let result = ImportConfig::from_root("/data").with_chunk_size(0);
        assert!(matches!(result, Err(ImportError::ConfigValueError { .. })));
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = TempDir::new().unwrap();
        let config = ImportConfig::from_root(dir.path());
        config.ensure_dirs().unwrap();
        assert!(config.source_dir.is_dir());
        assert!(dir.path().join("ai_assistant/database").is_dir());
    }
}
