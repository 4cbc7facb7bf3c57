//! # Pure Data Module - Data Transfer Objects Only
//!
//! ## Responsibilities
//!
//! - Define configuration data structures
//! - Provide TOML → DTO mapping
//!
//! ## Prohibited
//!
//! - No business logic or policies
//! - No validation logic
//! - No default value calculation inside `from_toml`
//!
//! Missing keys map to empty values. They are facts, not errors; the bootstrap
//! layer decides what an empty backend URL means.

use std::path::{Path, PathBuf};

/// Application configuration DTO (pure data, no logic)
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory for local state (draft cache, identity, file record store)
    pub data_dir: PathBuf,

    /// Base URL of the profile backend. Empty means "no remote backend".
    pub backend_url: String,

    /// API key sent with every backend request
    pub backend_api_key: String,

    /// Table holding one profile row per user
    pub backend_table: String,

    /// Per-request timeout in seconds. 0 means unset: the loader substitutes
    /// the default from [`AppConfig::with_base_dir`].
    pub backend_timeout_secs: u64,

    /// Automatic retries of a retryable save before surfacing the error
    pub save_retry_attempts: u32,

    /// Linear backoff unit between automatic retries, in milliseconds
    pub save_retry_backoff_ms: u64,

    /// Minimum age accepted by the birthday step
    pub min_age: u32,
}

impl AppConfig {
    /// Create AppConfig from TOML value
    ///
    /// **Prohibited**: This method must NOT contain any validation
    /// or default value logic.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let section = |name: &str, key: &str| toml_value.get(name).and_then(|s| s.get(key));
        let string = |name: &str, key: &str| {
            section(name, key)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };
        let integer = |name: &str, key: &str| {
            section(name, key)
                .and_then(|v| v.as_integer())
                .unwrap_or(0)
        };

        Ok(Self {
            data_dir: PathBuf::from(string("storage", "data_dir")),
            backend_url: string("backend", "url"),
            backend_api_key: string("backend", "api_key"),
            backend_table: string("backend", "table"),
            backend_timeout_secs: u64::try_from(integer("backend", "timeout_secs"))?,
            save_retry_attempts: u32::try_from(integer("onboarding", "save_retry_attempts"))?,
            save_retry_backoff_ms: u64::try_from(integer("onboarding", "save_retry_backoff_ms"))?,
            min_age: u32::try_from(integer("onboarding", "min_age"))?,
        })
    }

    /// Create empty AppConfig (all empty/default values)
    pub fn empty() -> Self {
        Self {
            data_dir: PathBuf::new(),
            backend_url: String::new(),
            backend_api_key: String::new(),
            backend_table: String::new(),
            backend_timeout_secs: 0,
            save_retry_attempts: 0,
            save_retry_backoff_ms: 0,
            min_age: 0,
        }
    }

    /// Create AppConfig with production defaults rooted at `base_dir`.
    ///
    /// The base directory is computed by the caller (e.g. with the `dirs` crate).
    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self {
            data_dir: base_dir.to_path_buf(),
            backend_url: String::new(),
            backend_api_key: String::new(),
            backend_table: "profiles".to_string(),
            backend_timeout_secs: 10,
            save_retry_attempts: 0,
            save_retry_backoff_ms: 500,
            min_age: 18,
        }
    }

    pub fn has_remote_backend(&self) -> bool {
        !self.backend_url.trim().is_empty()
    }
}
