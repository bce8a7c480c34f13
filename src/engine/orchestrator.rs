// ==========================================
// BI 資料匯入工具 - 匯入編排器
// ==========================================
// 用途: 依執行模式依序呼叫各子系統轉換，最後做完整性檢查
// 紅線: 單一子系統失敗只記錄，不中斷後續子系統
// ==========================================

use crate::config::ImportConfig;
use crate::domain::types::{RunMode, Subsystem};
use crate::engine::subsystems::{conversion_for, ConversionReport};
use crate::engine::verifier::{IntegrityVerifier, VerifyGroup, VerifyReport};
use crate::perf::{format_elapsed, PerfGuard};
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

// ==========================================
// RunSummary - 執行結果
// ==========================================

/// 單一子系統的結果
#[derive(Debug, Clone, Serialize)]
pub struct SubsystemResult {
    pub subsystem: Subsystem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ConversionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubsystemResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub mode: String,
    pub elapsed: String,
    pub elapsed_ms: u128,
    pub results: Vec<SubsystemResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerifyReport>,
}

impl RunSummary {
    pub fn failed(&self) -> Vec<Subsystem> {
        self.results
            .iter()
            .filter(|r| !r.is_ok())
            .map(|r| r.subsystem)
            .collect()
    }

    pub fn result_for(&self, subsystem: Subsystem) -> Option<&SubsystemResult> {
        self.results.iter().find(|r| r.subsystem == subsystem)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// 執行模式對應的檢查群組
pub fn verify_groups(mode: RunMode) -> Vec<VerifyGroup> {
    match mode {
        RunMode::SalesOnly => vec![VerifyGroup::SalesSystem],
        m if m.verifies() => VerifyGroup::ALL.to_vec(),
        _ => Vec::new(),
    }
}

// ==========================================
// Orchestrator
// ==========================================

pub struct Orchestrator {
    config: ImportConfig,
}

impl Orchestrator {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// 執行單一子系統（錯誤邊界）
    pub fn run_subsystem(&self, subsystem: Subsystem) -> SubsystemResult {
        let _perf = PerfGuard::new(subsystem.code());
        match conversion_for(subsystem).convert(&self.config) {
            Ok(report) => {
                let gaps = report.mapping_gaps();
                if !gaps.is_empty() {
                    warn!(subsystem = %subsystem, gaps = ?gaps, "部分欄位來源缺少");
                }
                info!(subsystem = %subsystem, rows = report.rows_written(), "子系統轉換完成");
                SubsystemResult {
                    subsystem,
                    report: Some(report),
                    error: None,
                }
            }
            Err(e) => {
                error!(subsystem = %subsystem, error = %e, "子系統轉換失敗，繼續下一個");
                SubsystemResult {
                    subsystem,
                    report: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// 依模式執行
    pub fn run(&self, mode: RunMode) -> RunSummary {
        let run_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        info!(run_id = %run_id, mode = ?mode, "開始資料匯入");

        if let Err(e) = self.config.ensure_dirs() {
            warn!(error = %e, "建立目錄失敗，仍嘗試繼續");
        }

        let results: Vec<SubsystemResult> = mode
            .subsystems()
            .into_iter()
            .map(|sub| self.run_subsystem(sub))
            .collect();

        let groups = verify_groups(mode);
        let verification = if groups.is_empty() {
            None
        } else {
            Some(IntegrityVerifier.verify(&self.config, &groups))
        };

        let elapsed = start.elapsed();
        let summary = RunSummary {
            run_id,
            mode: format!("{:?}", mode),
            elapsed: format_elapsed(elapsed),
            elapsed_ms: elapsed.as_millis(),
            results,
            verification,
        };

        let failed = summary.failed();
        info!(
            run_id = %summary.run_id,
            elapsed = %summary.elapsed,
            failed = failed.len(),
            "資料匯入結束"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_verify_groups_by_mode() {
        assert_eq!(verify_groups(RunMode::SalesOnly), vec![VerifyGroup::SalesSystem]);
        assert_eq!(verify_groups(RunMode::Daily).len(), 3);
        assert!(verify_groups(RunMode::InventoryOnly).is_empty());
        assert!(verify_groups(RunMode::Single(Subsystem::Sales)).is_empty());
    }

    #[test]
    fn test_missing_sources_do_not_stop_run() {
        let dir = TempDir::new().unwrap();
        let summary = Orchestrator::new(ImportConfig::from_root(dir.path())).run(RunMode::Full);

        assert_eq!(summary.results.len(), 9);
        assert_eq!(summary.failed().len(), 9);
        let verification = summary.verification.as_ref().unwrap();
        assert_eq!(verification.entries.len(), 12);
        assert!(summary.elapsed.ends_with('秒'));
        assert!(summary.to_json().unwrap().contains("\"run_id\""));
    }
}
