//! Remote profile record store port.
//!
//! The backend is an opaque record store keyed by user. It must support
//! partial-column upserts and is assumed to give read-your-writes consistency
//! for the same user.

use async_trait::async_trait;
use thiserror::Error;

use crate::ids::UserId;
use crate::onboarding::{ProfileRecord, ProfileRecordPatch};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordStoreError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("backend unavailable (status {status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("rate limited by backend")]
    RateLimited,

    #[error("record rejected: {0}")]
    Rejected(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}

impl RecordStoreError {
    /// Transient failures where resending the same upsert is safe and may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Network(_) | Self::Unavailable { .. } | Self::RateLimited
        )
    }
}

#[async_trait]
pub trait ProfileRecordPort: Send + Sync {
    /// Insert the record if absent, otherwise overwrite the patched columns.
    async fn upsert(
        &self,
        user_id: &UserId,
        patch: &ProfileRecordPatch,
    ) -> Result<(), RecordStoreError>;

    /// `Ok(None)` when the user has no record yet.
    async fn fetch(&self, user_id: &UserId) -> Result<Option<ProfileRecord>, RecordStoreError>;
}
