//! # Configuration Loader / 配置加载器
//!
//! Pure data loading: read the TOML file and map it onto [`AppConfig`].
//! No validation and no defaults here; the policies in `cc-app` own those.
//! 仅纯数据加载，不做验证，不设默认值。

use std::path::{Path, PathBuf};

use anyhow::Context;
use cc_core::config::AppConfig;
use tracing::debug;

const APP_DIR_NAME: &str = "cloudclip";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Load configuration from a TOML file.
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    Ok(AppConfig::from_toml(&toml_value))
}

/// `$CONFIG_DIR/cloudclip/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Resolve the effective configuration.
///
/// An explicit path must exist. The default location is optional; when no
/// file is there the empty configuration is used.
pub fn resolve_config(explicit: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    match explicit {
        Some(path) => load_config(&path),
        None => match default_config_path() {
            Some(path) if path.exists() => load_config(&path),
            other => {
                debug!(path = ?other, "No config file found, using empty config");
                Ok(AppConfig::empty())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file
    }

    /// 测试有效 TOML 被正确解析
    #[test]
    fn test_load_config_reads_valid_toml() {
        let file = write_config(
            r#"
            [auth]
            min_password_len = 8

            [entries]
            max_entry_len = 2048

            [subscription]
            retry_ceiling = 3
            backoff_base_ms = 100
            backoff_max_ms = 1600

            [logging]
            directory = "/var/log/cloudclip"
        "#,
        );

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.min_password_len, 8);
        assert_eq!(config.max_entry_len, 2048);
        assert_eq!(config.retry_ceiling, 3);
        assert_eq!(config.backoff_base_ms, 100);
        assert_eq!(config.backoff_max_ms, 1600);
        assert_eq!(config.log_directory, PathBuf::from("/var/log/cloudclip"));
    }

    /// 测试缺失的值导致空值
    #[test]
    fn test_load_config_returns_empty_values_when_missing() {
        let file = write_config(
            r#"
            [subscription]
            # retry_ceiling is missing
        "#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config, AppConfig::empty());
    }

    #[test]
    fn test_load_config_rejects_invalid_toml() {
        let file = write_config("[auth\nmin_password_len = ");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("TOML"));
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = resolve_config(Some(missing)).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_explicit_path_is_loaded() {
        let file = write_config("[entries]\nmax_entry_len = 12\n");
        let config = resolve_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.max_entry_len, 12);
    }
}
