// ==========================================
// BI 資料匯入工具 - 領域類型定義
// ==========================================
// 子系統目錄、執行模式
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// Subsystem - 子系統
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    Customer,    // 客戶主檔
    Sales,       // 銷售主檔/明細
    Repair,      // 維修資料
    Custody,     // 寄倉主檔/明細
    ServiceCard, // 服務登記卡
    CrmNotes,    // CRM 記事
    SalesAi,     // AI 專用銷售資料
    Procurement, // 採購到貨進度（增量）
    Inventory,   // 正航庫存
}

impl Subsystem {
    pub const ALL: [Subsystem; 9] = [
        Subsystem::Customer,
        Subsystem::Sales,
        Subsystem::Repair,
        Subsystem::Custody,
        Subsystem::ServiceCard,
        Subsystem::CrmNotes,
        Subsystem::SalesAi,
        Subsystem::Procurement,
        Subsystem::Inventory,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Subsystem::Customer => "customer",
            Subsystem::Sales => "sales",
            Subsystem::Repair => "repair",
            Subsystem::Custody => "custody",
            Subsystem::ServiceCard => "service_card",
            Subsystem::CrmNotes => "crm_notes",
            Subsystem::SalesAi => "sales_ai",
            Subsystem::Procurement => "procurement",
            Subsystem::Inventory => "inventory",
        }
    }

    /// i18n 鍵
    pub fn label_key(&self) -> String {
        format!("subsystem.{}", self.code())
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Subsystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Subsystem::ALL
            .iter()
            .copied()
            .find(|sub| sub.code() == normalized)
            .ok_or_else(|| format!("未知的子系統: {}", s))
    }
}

// ==========================================
// RunMode - 執行模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// 完整重建（所有子系統 + 驗證）
    Full,
    /// 每日更新（不含 CRM 記事）
    Daily,
    /// 僅銷售查詢系統
    SalesOnly,
    /// 僅庫存查詢系統
    InventoryOnly,
    /// 單一子系統
    Single(Subsystem),
    /// 僅資料完整性檢查
    Verify,
}

impl RunMode {
    /// 此模式依序執行的子系統
    pub fn subsystems(&self) -> Vec<Subsystem> {
        use Subsystem::*;
        match self {
            RunMode::Full => vec![
                Customer,
                Sales,
                Repair,
                Custody,
                CrmNotes,
                ServiceCard,
                SalesAi,
                Procurement,
                Inventory,
            ],
            RunMode::Daily => vec![
                Customer,
                Sales,
                Repair,
                Custody,
                ServiceCard,
                SalesAi,
                Procurement,
                Inventory,
            ],
            RunMode::SalesOnly => vec![
                Customer,
                Sales,
                Repair,
                CrmNotes,
                Custody,
                ServiceCard,
                SalesAi,
            ],
            RunMode::InventoryOnly => vec![Inventory],
            RunMode::Single(sub) => vec![*sub],
            RunMode::Verify => Vec::new(),
        }
    }

    /// 執行後是否進行完整性檢查
    pub fn verifies(&self) -> bool {
        matches!(
            self,
            RunMode::Full | RunMode::Daily | RunMode::SalesOnly | RunMode::Verify
        )
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(RunMode::Full),
            "daily" => Ok(RunMode::Daily),
            "sales" | "sales_only" => Ok(RunMode::SalesOnly),
            "inventory_only" => Ok(RunMode::InventoryOnly),
            "verify" => Ok(RunMode::Verify),
            other => other.parse::<Subsystem>().map(RunMode::Single),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_roundtrip_code() {
        for sub in Subsystem::ALL {
            assert_eq!(sub.code().parse::<Subsystem>().unwrap(), sub);
        }
        assert_eq!("service-card".parse::<Subsystem>().unwrap(), Subsystem::ServiceCard);
        assert!("bogus".parse::<Subsystem>().is_err());
    }

    #[test]
    fn test_daily_excludes_crm_notes() {
        assert!(RunMode::Full.subsystems().contains(&Subsystem::CrmNotes));
        assert!(!RunMode::Daily.subsystems().contains(&Subsystem::CrmNotes));
        assert_eq!(RunMode::Daily.subsystems().len(), 8);
    }

    #[test]
    fn test_run_mode_parse() {
        assert_eq!("daily".parse::<RunMode>().unwrap(), RunMode::Daily);
        assert_eq!("inventory".parse::<RunMode>().unwrap(), RunMode::Single(Subsystem::Inventory));
        assert_eq!("inventory_only".parse::<RunMode>().unwrap(), RunMode::InventoryOnly);
        assert!(!RunMode::Single(Subsystem::Sales).verifies());
    }
}
