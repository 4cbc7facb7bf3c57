//! Local draft cache port
//!
//! Keeps the last saved draft on the device so guest (unauthenticated) drafting
//! survives an app restart.

use async_trait::async_trait;
use thiserror::Error;

use crate::onboarding::Draft;

#[derive(Debug, Error)]
pub enum DraftCacheError {
    #[error("draft cache io error: {0}")]
    Io(String),

    #[error("draft cache is corrupt: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait LocalDraftPort: Send + Sync {
    async fn load(&self) -> Result<Option<Draft>, DraftCacheError>;

    async fn store(&self, draft: &Draft) -> Result<(), DraftCacheError>;

    async fn clear(&self) -> Result<(), DraftCacheError>;
}
