use std::path::PathBuf;

/// Application configuration DTO (pure data, no logic)
/// 应用配置 DTO（纯数据，无逻辑）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Minimum sign-up password length (0 = not configured)
    pub min_password_len: usize,

    /// Maximum entry length in characters (0 = not configured)
    pub max_entry_len: usize,

    /// Consecutive transport failures tolerated before the view is marked degraded
    pub retry_ceiling: u32,

    /// First retry delay in milliseconds
    pub backoff_base_ms: u64,

    /// Upper bound for the retry delay in milliseconds
    pub backoff_max_ms: u64,

    /// Log directory (path info only, no existence check)
    pub log_directory: PathBuf,
}

impl AppConfig {
    /// Create AppConfig from TOML value
    /// 从 TOML 值创建 AppConfig
    ///
    /// Missing sections and keys become empty values; nothing is validated.
    pub fn from_toml(toml_value: &toml::Value) -> Self {
        let int = |section: &str, key: &str| {
            toml_value
                .get(section)
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_integer())
                .unwrap_or(0)
                .max(0)
        };

        Self {
            min_password_len: int("auth", "min_password_len") as usize,
            max_entry_len: int("entries", "max_entry_len") as usize,
            retry_ceiling: int("subscription", "retry_ceiling").min(u32::MAX as i64) as u32,
            backoff_base_ms: int("subscription", "backoff_base_ms") as u64,
            backoff_max_ms: int("subscription", "backoff_max_ms") as u64,
            log_directory: PathBuf::from(
                toml_value
                    .get("logging")
                    .and_then(|l| l.get("directory"))
                    .and_then(|v| v.as_str())
                    .unwrap_or(""),
            ),
        }
    }

    /// Create empty AppConfig (all empty/default values)
    /// 创建空的 AppConfig（所有字段为空/默认值）
    pub fn empty() -> Self {
        Self {
            min_password_len: 0,
            max_entry_len: 0,
            retry_ceiling: 0,
            backoff_base_ms: 0,
            backoff_max_ms: 0,
            log_directory: PathBuf::new(),
        }
    }
}
