// ==========================================
// 國際化 (i18n) 模組
// ==========================================
// 使用 rust-i18n；支援繁體中文（預設）與英文
// 選單、結束橫幅與完整性檢查標籤皆由此取得
// ==========================================
// 注意: rust_i18n::i18n! 巨集已在 lib.rs 中初始化
// ==========================================

pub const DEFAULT_LOCALE: &str = "zh-TW";

pub const SUPPORTED_LOCALES: [&str; 2] = ["zh-TW", "en"];

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 設定語言；不支援的代碼改用預設語言並回傳 false
pub fn set_locale(locale: &str) -> bool {
    let supported = SUPPORTED_LOCALES.contains(&locale);
    rust_i18n::set_locale(if supported { locale } else { DEFAULT_LOCALE });
    supported
}

/// 翻譯訊息（無參數）
///
/// # 範例
/// ```no_run
/// use bi_data_import::i18n::t;
/// let title = t("menu.title");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻譯訊息（帶參數，佔位符為 `%{name}`）
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Subsystem;
    use std::sync::Mutex;

    // locale 為全域狀態，測試預設平行執行，需序列化
    static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        assert!(set_locale("en"));
        assert_eq!(current_locale(), "en");

        assert!(!set_locale("fr"));
        assert_eq!(current_locale(), DEFAULT_LOCALE);
    }

    #[test]
    fn test_subsystem_labels_exist_in_both_locales() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        for locale in SUPPORTED_LOCALES {
            set_locale(locale);
            for sub in Subsystem::ALL {
                let key = sub.label_key();
                assert!(!t(&key).contains("subsystem."), "{} 缺少 {}", locale, key);
            }
        }
        set_locale(DEFAULT_LOCALE);
        assert_eq!(t("subsystem.procurement"), "採購到貨進度");
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("zh-TW");
        let msg = t_with_args("common.elapsed", &[("elapsed", "1分5秒")]);
        assert!(msg.contains("1分5秒"));

        set_locale("en");
        let msg = t_with_args("verify.rows", &[("label", "Sales main"), ("count", "12")]);
        assert_eq!(msg, "Sales main: 12 rows");

        set_locale(DEFAULT_LOCALE);
    }
}
