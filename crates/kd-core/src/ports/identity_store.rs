use thiserror::Error;

use crate::ids::UserId;

#[derive(Debug, Error)]
pub enum IdentityStoreError {
    #[error("identity store failure: {0}")]
    Store(String),

    #[error("identity data corrupt: {0}")]
    Corrupt(String),
}

/// Persists the signed-in user between app launches.
pub trait IdentityStorePort: Send + Sync {
    fn load_identity(&self) -> Result<Option<UserId>, IdentityStoreError>;

    fn store_identity(&self, user_id: &UserId) -> Result<(), IdentityStoreError>;

    fn clear_identity(&self) -> Result<(), IdentityStoreError>;
}
