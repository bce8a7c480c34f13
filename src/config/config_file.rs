use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 設定檔名稱（放在資料根目錄）
pub const CONFIG_FILE_NAME: &str = "bi-import.toml";

/// TOML 設定檔（所有欄位皆可省略，省略時沿用內建預設）
///
/// 相對路徑以資料根目錄為基準。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// 來源試算表目錄
    #[serde(default)]
    pub source_dir: Option<PathBuf>,

    /// 每批寫入筆數
    #[serde(default)]
    pub chunk_size: Option<usize>,

    /// 各資料庫檔案路徑
    #[serde(default)]
    pub stores: StoreOverrides,

    /// 庫存屬性顯示名稱（整段取代內建對照表）
    #[serde(default)]
    pub inventory_attribute_labels: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreOverrides {
    #[serde(default)]
    pub sales: Option<PathBuf>,
    #[serde(default)]
    pub repair: Option<PathBuf>,
    #[serde(default)]
    pub custody: Option<PathBuf>,
    #[serde(default)]
    pub customer: Option<PathBuf>,
    #[serde(default)]
    pub service_card: Option<PathBuf>,
    #[serde(default)]
    pub inventory: Option<PathBuf>,
    #[serde(default)]
    pub procurement: Option<PathBuf>,
    #[serde(default)]
    pub crm_notes: Option<PathBuf>,
    #[serde(default)]
    pub sales_ai: Option<PathBuf>,
}

impl ConfigFile {
    pub fn parse(text: &str, origin: &Path) -> ImportResult<Self> {
        toml::from_str(text).map_err(|e| ImportError::ConfigReadError {
            path: origin.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> ImportResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ImportError::ConfigReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&text, path)
    }
}
