//! File-based local draft cache
//!
//! Keeps the last saved onboarding draft in a JSON file in the application
//! data directory, so guest drafting survives a restart.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use kd_core::onboarding::Draft;
use kd_core::ports::{DraftCacheError, LocalDraftPort};

use crate::fs::{read_json, write_json_atomic};

pub const DEFAULT_DRAFT_CACHE_FILE: &str = ".onboarding_draft";

pub struct FileDraftCacheRepository {
    cache_file_path: PathBuf,
}

impl FileDraftCacheRepository {
    /// Create repository with custom file path
    pub fn new(cache_file_path: PathBuf) -> Self {
        Self { cache_file_path }
    }

    /// Create repository with base dir and filename
    pub fn with_base_dir(base_dir: PathBuf, filename: impl Into<String>) -> Self {
        Self {
            cache_file_path: base_dir.join(filename.into()),
        }
    }

    /// Create repository with defaults
    pub fn with_defaults(base_dir: PathBuf) -> Self {
        Self {
            cache_file_path: base_dir.join(DEFAULT_DRAFT_CACHE_FILE),
        }
    }
}

#[async_trait]
impl LocalDraftPort for FileDraftCacheRepository {
    async fn load(&self) -> Result<Option<Draft>, DraftCacheError> {
        read_json(&self.cache_file_path)
            .await
            .map_err(|e| DraftCacheError::Corrupt(format!("{e:#}")))
    }

    async fn store(&self, draft: &Draft) -> Result<(), DraftCacheError> {
        write_json_atomic(&self.cache_file_path, draft)
            .await
            .map_err(|e| DraftCacheError::Io(format!("{e:#}")))
    }

    async fn clear(&self) -> Result<(), DraftCacheError> {
        match fs::remove_file(&self.cache_file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DraftCacheError::Io(format!(
                "Failed to remove draft cache: {e}"
            ))),
        }
    }
}
