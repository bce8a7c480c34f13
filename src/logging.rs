// ==========================================
// 日誌系統初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支援環境變數設定日誌層級
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日誌系統
///
/// # 環境變數
/// - RUST_LOG: 日誌層級過濾（預設: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=bi_data_import=trace
///
/// # 範例
/// ```no_run
/// use bi_data_import::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // try_init: 互動選單重複進入時不會 panic
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .try_init();
}

/// 以 JSON 格式輸出（排程器收集日誌用）
pub fn init_json() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().json().with_env_filter(filter).try_init();
}

/// 初始化測試環境的日誌系統
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
