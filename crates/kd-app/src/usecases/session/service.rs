use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use kd_core::ports::{IdentityStoreError, IdentityStorePort, LocalDraftPort};
use kd_core::UserId;

use crate::usecases::startup::Initialize;

/// Who is signed in right now. `None` is a legitimate state (guest drafting).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_identity(&self) -> Option<UserId>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("user id must not be blank")]
    InvalidIdentity,
    #[error("already signed in as {current}")]
    AlreadySignedIn { current: UserId },
    #[error(transparent)]
    Store(#[from] IdentityStoreError),
}

/// Holds the authenticated user for the lifetime of the app and persists it
/// between launches.
///
/// The on-device draft cache is shared by whoever uses the device, so signing
/// out wipes it.
pub struct SessionService {
    store: Arc<dyn IdentityStorePort>,
    draft_cache: Option<Arc<dyn LocalDraftPort>>,
    current: RwLock<Option<UserId>>,
}

impl SessionService {
    pub fn new(store: Arc<dyn IdentityStorePort>) -> Self {
        Self {
            store,
            draft_cache: None,
            current: RwLock::new(None),
        }
    }

    pub fn with_draft_cache(mut self, cache: Arc<dyn LocalDraftPort>) -> Self {
        self.draft_cache = Some(cache);
        self
    }

    /// Load the persisted identity, if any.
    pub async fn load(&self) -> Result<Option<UserId>, SessionError> {
        let loaded = self.store.load_identity()?;
        match &loaded {
            Some(user_id) => info!(user_id = %user_id, "session restored"),
            None => info!("no stored session, continuing as guest"),
        }
        *self.current.write().await = loaded.clone();
        Ok(loaded)
    }

    /// Signing in again as the same user is a no-op.
    pub async fn sign_in(&self, user_id: UserId) -> Result<(), SessionError> {
        if !user_id.is_valid() {
            return Err(SessionError::InvalidIdentity);
        }

        let mut current = self.current.write().await;
        match current.as_ref() {
            Some(existing) if *existing == user_id => return Ok(()),
            Some(existing) => {
                return Err(SessionError::AlreadySignedIn {
                    current: existing.clone(),
                })
            }
            None => {}
        }

        self.store.store_identity(&user_id)?;
        info!(user_id = %user_id, "signed in");
        *current = Some(user_id);
        Ok(())
    }

    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let mut current = self.current.write().await;
        self.store.clear_identity()?;
        if let Some(cache) = &self.draft_cache {
            if let Err(err) = cache.clear().await {
                warn!(error = %err, "failed to clear local draft cache on sign-out");
            }
        }
        if let Some(user_id) = current.take() {
            info!(user_id = %user_id, "signed out");
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for SessionService {
    async fn current_identity(&self) -> Option<UserId> {
        self.current.read().await.clone()
    }
}

#[async_trait]
impl Initialize for SessionService {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn initialize(&self) -> anyhow::Result<()> {
        if let Err(err) = self.load().await {
            warn!(error = %err, "failed to restore session");
            return Err(err.into());
        }
        Ok(())
    }
}
