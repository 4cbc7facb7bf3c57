use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use kd_core::onboarding::{ProfileRecord, ProfileRecordPatch};
use kd_core::ports::{ProfileRecordPort, RecordStoreError};
use kd_core::UserId;

/// Process-local record store. Used for guest sessions without a backend and in tests.
#[derive(Default)]
pub struct InMemoryProfileRecordStore {
    records: RwLock<HashMap<UserId, ProfileRecord>>,
}

impl InMemoryProfileRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Seed a record directly, bypassing upsert.
    pub async fn insert(&self, record: ProfileRecord) {
        self.records.write().await.insert(record.id.clone(), record);
    }
}

#[async_trait]
impl ProfileRecordPort for InMemoryProfileRecordStore {
    async fn upsert(
        &self,
        user_id: &UserId,
        patch: &ProfileRecordPatch,
    ) -> Result<(), RecordStoreError> {
        let mut records = self.records.write().await;
        records
            .entry(user_id.clone())
            .and_modify(|record| record.apply(patch))
            .or_insert_with(|| ProfileRecord::from_patch(user_id.clone(), patch));
        debug!(user_id = %user_id, step = patch.onboarding_step, "in-memory record upserted");
        Ok(())
    }

    async fn fetch(&self, user_id: &UserId) -> Result<Option<ProfileRecord>, RecordStoreError> {
        Ok(self.records.read().await.get(user_id).cloned())
    }
}
