//! # Configuration Loader
//!
//! `load_config` reads a TOML file into the [`AppConfig`] DTO and nothing
//! else: no validation, no defaults. Empty strings and zeros are facts.
//!
//! `resolve_config` is where the bootstrap decides what those facts mean:
//! it locates the file (flag, then `KINDRED_CONFIG`, then `kindred.toml` in
//! the data directory) and fills unset values
//! from production defaults rooted at the platform data directory.

use std::path::{Path, PathBuf};

use anyhow::Context;
use kd_core::config::AppConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "KINDRED_CONFIG";

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns error if the file cannot be read, is not valid TOML, or holds a
/// negative number where a count is expected.
pub fn load_config(config_path: PathBuf) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    AppConfig::from_toml(&toml_value)
}

/// Locate, load and complete the configuration for this run.
pub fn resolve_config(explicit_path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let data_root = kd_infra::fs::app_data_dir()?;
    let defaults = AppConfig::with_base_dir(&data_root);

    let path = explicit_path
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
        .or_else(|| {
            let candidate = default_config_path(&data_root);
            candidate.is_file().then_some(candidate)
        });
    match path {
        Some(path) => {
            let loaded = load_config(path)?;
            Ok(fill_unset(loaded, defaults))
        }
        None => Ok(defaults),
    }
}

/// Replace empty values in `loaded` with the matching value from `defaults`.
///
/// `save_retry_attempts = 0` is a meaningful choice and is kept as is.
fn fill_unset(loaded: AppConfig, defaults: AppConfig) -> AppConfig {
    fn or_path(value: PathBuf, default: PathBuf) -> PathBuf {
        if value.as_os_str().is_empty() {
            default
        } else {
            value
        }
    }
    fn or_string(value: String, default: String) -> String {
        if value.trim().is_empty() {
            default
        } else {
            value
        }
    }
    fn or_number<T: PartialEq + Default>(value: T, default: T) -> T {
        if value == T::default() {
            default
        } else {
            value
        }
    }

    AppConfig {
        data_dir: or_path(loaded.data_dir, defaults.data_dir),
        backend_url: loaded.backend_url,
        backend_api_key: loaded.backend_api_key,
        backend_table: or_string(loaded.backend_table, defaults.backend_table),
        backend_timeout_secs: or_number(loaded.backend_timeout_secs, defaults.backend_timeout_secs),
        save_retry_attempts: loaded.save_retry_attempts,
        save_retry_backoff_ms: or_number(
            loaded.save_retry_backoff_ms,
            defaults.save_retry_backoff_ms,
        ),
        min_age: or_number(loaded.min_age, defaults.min_age),
    }
}

/// Default location of the config file inside the data directory.
pub fn default_config_path(data_root: &Path) -> PathBuf {
    data_root.join("kindred.toml")
}
