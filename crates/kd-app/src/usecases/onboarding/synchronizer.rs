//! Persistence synchronizer.
//!
//! Stateless bridge between the in-memory draft and the remote profile record.
//! Performs no retries; the step controller owns that policy.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use kd_core::onboarding::{Draft, PersistenceError, ProfileRecordPatch};
use kd_core::ports::{LocalDraftPort, ProfileRecordPort};
use kd_core::UserId;

/// Where a successful save landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    /// Upserted to the remote record for the signed-in user.
    Remote,
    /// No identity yet; the draft only lives on this device.
    LocalOnly,
}

pub struct ProfileSynchronizer {
    records: Arc<dyn ProfileRecordPort>,
    local_cache: Option<Arc<dyn LocalDraftPort>>,
}

impl ProfileSynchronizer {
    pub fn new(records: Arc<dyn ProfileRecordPort>) -> Self {
        Self {
            records,
            local_cache: None,
        }
    }

    pub fn with_local_cache(mut self, cache: Arc<dyn LocalDraftPort>) -> Self {
        self.local_cache = Some(cache);
        self
    }

    /// Upsert `draft` for `identity`.
    ///
    /// Every field in the draft overwrites its column; other columns are left
    /// alone. `onboarding_step` is the draft's current step and
    /// `onboarding_completed` is set once the draft sits at its terminal index.
    pub async fn save_progress(
        &self,
        identity: Option<&UserId>,
        draft: &Draft,
    ) -> Result<SaveOutcome, PersistenceError> {
        let Some(user_id) = identity else {
            debug!(step = draft.current_step(), "no identity, keeping draft local");
            self.store_local(draft).await;
            return Ok(SaveOutcome::LocalOnly);
        };

        let patch = ProfileRecordPatch::from_draft(draft);
        self.records.upsert(user_id, &patch).await.map_err(|err| {
            warn!(
                user_id = %user_id,
                step = patch.onboarding_step,
                retryable = err.is_retryable(),
                error = %err,
                "profile upsert failed"
            );
            PersistenceError::from(err)
        })?;

        info!(
            user_id = %user_id,
            step = patch.onboarding_step,
            completed = patch.onboarding_completed,
            fields = patch.fields.len(),
            "onboarding progress saved"
        );
        self.store_local(draft).await;
        Ok(SaveOutcome::Remote)
    }

    /// Load the last saved draft.
    ///
    /// With an identity this reads the remote record. Steps confirmed on this
    /// device but not yet upserted (guest drafting before sign-in) win over a
    /// missing or older record, so the next save carries them up. Without an
    /// identity only the local cache is read.
    pub async fn load_progress(
        &self,
        identity: Option<&UserId>,
        total_steps: u32,
    ) -> Result<Draft, PersistenceError> {
        let Some(user_id) = identity else {
            return Ok(self
                .load_local(total_steps)
                .await
                .unwrap_or_else(|| Draft::new(total_steps)));
        };

        let record = self.records.fetch(user_id).await.map_err(|err| {
            warn!(user_id = %user_id, error = %err, "profile fetch failed");
            PersistenceError::from(err)
        })?;
        let local = self.load_local(total_steps).await;

        match (record, local) {
            (Some(record), Some(local))
                if !record.onboarding_completed
                    && local.current_step() > record.onboarding_step =>
            {
                let draft = record
                    .to_draft(total_steps)
                    .merged_with(local.fields())
                    .at_step(local.current_step());
                info!(
                    user_id = %user_id,
                    remote_step = record.onboarding_step,
                    step = draft.current_step(),
                    "local draft is ahead of the profile record, resuming from it"
                );
                Ok(draft)
            }
            (Some(record), _) => {
                let draft = record.to_draft(total_steps);
                info!(
                    user_id = %user_id,
                    step = draft.current_step(),
                    completed = record.onboarding_completed,
                    "onboarding progress loaded"
                );
                Ok(draft)
            }
            (None, Some(local)) => {
                info!(
                    user_id = %user_id,
                    step = local.current_step(),
                    "no profile record yet, resuming local draft"
                );
                Ok(local)
            }
            (None, None) => {
                debug!(user_id = %user_id, "no profile record yet");
                Ok(Draft::new(total_steps))
            }
        }
    }

    /// Drop the on-device copy of the draft.
    pub async fn discard_local(&self) {
        if let Some(cache) = &self.local_cache {
            if let Err(err) = cache.clear().await {
                warn!(error = %err, "failed to clear local draft cache");
            }
        }
    }

    async fn store_local(&self, draft: &Draft) {
        if let Some(cache) = &self.local_cache {
            if let Err(err) = cache.store(draft).await {
                warn!(error = %err, "failed to write local draft cache");
            }
        }
    }

    async fn load_local(&self, total_steps: u32) -> Option<Draft> {
        let cache = self.local_cache.as_ref()?;
        match cache.load().await {
            Ok(Some(draft)) if !draft.is_empty() => {
                debug!(step = draft.current_step(), "draft restored from local cache");
                Some(Draft::from_parts(
                    draft.fields().clone(),
                    draft.current_step(),
                    total_steps,
                ))
            }
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "local draft cache unreadable, starting fresh");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kd_core::onboarding::{field_map, PersistenceErrorKind, ProfileRecord};
    use kd_core::ports::{DraftCacheError, RecordStoreError};
    use mockall::{mock, predicate::eq};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    mock! {
        pub Records {}

        #[async_trait]
        impl ProfileRecordPort for Records {
            async fn upsert(
                &self,
                user_id: &UserId,
                patch: &ProfileRecordPatch,
            ) -> Result<(), RecordStoreError>;
            async fn fetch(
                &self,
                user_id: &UserId,
            ) -> Result<Option<ProfileRecord>, RecordStoreError>;
        }
    }

    #[derive(Default)]
    struct MemoryCache {
        draft: StdMutex<Option<Draft>>,
    }

    #[async_trait]
    impl LocalDraftPort for MemoryCache {
        async fn load(&self) -> Result<Option<Draft>, DraftCacheError> {
            Ok(self.draft.lock().unwrap().clone())
        }

        async fn store(&self, draft: &Draft) -> Result<(), DraftCacheError> {
            *self.draft.lock().unwrap() = Some(draft.clone());
            Ok(())
        }

        async fn clear(&self) -> Result<(), DraftCacheError> {
            *self.draft.lock().unwrap() = None;
            Ok(())
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl LocalDraftPort for BrokenCache {
        async fn load(&self) -> Result<Option<Draft>, DraftCacheError> {
            Err(DraftCacheError::Corrupt("bad json".into()))
        }

        async fn store(&self, _draft: &Draft) -> Result<(), DraftCacheError> {
            Err(DraftCacheError::Io("disk full".into()))
        }

        async fn clear(&self) -> Result<(), DraftCacheError> {
            Err(DraftCacheError::Io("disk full".into()))
        }
    }

    fn user() -> UserId {
        UserId::new("user-1")
    }

    #[tokio::test]
    async fn test_save_without_identity_is_local_only() {
        let mut records = MockRecords::new();
        records.expect_upsert().never();
        let sync = ProfileSynchronizer::new(Arc::new(records));

        let outcome = sync.save_progress(None, &Draft::new(5)).await.unwrap();

        assert_eq!(outcome, SaveOutcome::LocalOnly);
    }

    #[tokio::test]
    async fn test_save_upserts_patch_from_draft() {
        let draft = Draft::from_parts(field_map([("name", "Alex")]), 3, 5);
        let expected = ProfileRecordPatch::from_draft(&draft);

        let mut records = MockRecords::new();
        records
            .expect_upsert()
            .with(eq(user()), eq(expected))
            .times(1)
            .returning(|_, _| Ok(()));
        let sync = ProfileSynchronizer::new(Arc::new(records));

        let outcome = sync.save_progress(Some(&user()), &draft).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Remote);
    }

    #[tokio::test]
    async fn test_save_classifies_failures() {
        let calls = AtomicUsize::new(0);
        let mut records = MockRecords::new();
        records.expect_upsert().times(2).returning(move |_, _| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(RecordStoreError::Timeout)
            } else {
                Err(RecordStoreError::Rejected("bad column".into()))
            }
        });
        let sync = ProfileSynchronizer::new(Arc::new(records));

        let err = sync
            .save_progress(Some(&user()), &Draft::new(5))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.kind, PersistenceErrorKind::Timeout);

        let err = sync
            .save_progress(Some(&user()), &Draft::new(5))
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(err.kind, PersistenceErrorKind::Rejected);
    }

    #[tokio::test]
    async fn test_load_without_record_returns_empty_draft() {
        let mut records = MockRecords::new();
        records.expect_fetch().returning(|_| Ok(None));
        let sync = ProfileSynchronizer::new(Arc::new(records));

        let draft = sync.load_progress(Some(&user()), 5).await.unwrap();
        assert_eq!(draft, Draft::new(5));
    }

    #[tokio::test]
    async fn test_load_hydrates_non_null_columns_and_step() {
        let mut record = ProfileRecord::new(user());
        record.onboarding_step = 3;
        record.columns.insert("name".into(), Some("Alex".into()));
        record.columns.insert("occupation".into(), None);

        let mut records = MockRecords::new();
        records
            .expect_fetch()
            .with(eq(user()))
            .returning(move |_| Ok(Some(record.clone())));
        let sync = ProfileSynchronizer::new(Arc::new(records));

        let draft = sync.load_progress(Some(&user()), 5).await.unwrap();
        assert_eq!(draft.current_step(), 3);
        assert_eq!(draft.fields(), &field_map([("name", "Alex")]));
    }

    #[tokio::test]
    async fn test_local_cache_written_on_success_and_used_for_guests() {
        let mut records = MockRecords::new();
        records.expect_upsert().returning(|_, _| Ok(()));
        let cache = Arc::new(MemoryCache::default());
        let sync = ProfileSynchronizer::new(Arc::new(records)).with_local_cache(cache.clone());

        let draft = Draft::from_parts(field_map([("gender", "woman")]), 1, 5);
        sync.save_progress(Some(&user()), &draft).await.unwrap();

        let restored = sync.load_progress(None, 5).await.unwrap();
        assert_eq!(restored, draft);

        sync.discard_local().await;
        assert!(cache.draft.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_cache_not_written_on_failure() {
        let mut records = MockRecords::new();
        records
            .expect_upsert()
            .returning(|_, _| Err(RecordStoreError::Network("reset".into())));
        let cache = Arc::new(MemoryCache::default());
        let sync = ProfileSynchronizer::new(Arc::new(records)).with_local_cache(cache.clone());

        let _ = sync.save_progress(Some(&user()), &Draft::new(5)).await;

        assert!(cache.draft.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_errors_never_fail_the_save() {
        let mut records = MockRecords::new();
        records.expect_upsert().returning(|_, _| Ok(()));
        let sync =
            ProfileSynchronizer::new(Arc::new(records)).with_local_cache(Arc::new(BrokenCache));

        let outcome = sync.save_progress(Some(&user()), &Draft::new(5)).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Remote);

        let restored = sync.load_progress(None, 5).await.unwrap();
        assert_eq!(restored, Draft::new(5));
        sync.discard_local().await;
    }

    #[tokio::test]
    async fn test_signed_in_load_picks_up_guest_draft_without_record() {
        let mut records = MockRecords::new();
        records.expect_fetch().returning(|_| Ok(None));
        let cache = Arc::new(MemoryCache::default());
        let guest = Draft::from_parts(
            field_map([("gender", "woman"), ("looking_for", "men")]),
            1,
            5,
        );
        cache.store(&guest).await.unwrap();
        let sync = ProfileSynchronizer::new(Arc::new(records)).with_local_cache(cache);

        let draft = sync.load_progress(Some(&user()), 5).await.unwrap();

        assert_eq!(draft, guest);
    }

    #[tokio::test]
    async fn test_signed_in_load_prefers_local_draft_ahead_of_record() {
        let mut record = ProfileRecord::new(user());
        record.onboarding_step = 1;
        record.columns.insert("gender".into(), Some("man".into()));
        record.columns.insert("bio".into(), Some("hi".into()));
        let mut records = MockRecords::new();
        records
            .expect_fetch()
            .returning(move |_| Ok(Some(record.clone())));
        let cache = Arc::new(MemoryCache::default());
        cache
            .store(&Draft::from_parts(
                field_map([("gender", "woman"), ("birthdate", "1990-04-12")]),
                2,
                5,
            ))
            .await
            .unwrap();
        let sync = ProfileSynchronizer::new(Arc::new(records)).with_local_cache(cache);

        let draft = sync.load_progress(Some(&user()), 5).await.unwrap();

        assert_eq!(draft.current_step(), 2);
        assert_eq!(
            draft.fields(),
            &field_map([("bio", "hi"), ("birthdate", "1990-04-12"), ("gender", "woman")])
        );
    }

    #[tokio::test]
    async fn test_signed_in_load_prefers_record_when_not_behind() {
        let mut record = ProfileRecord::new(user());
        record.onboarding_step = 3;
        record.columns.insert("name".into(), Some("Alex".into()));
        let mut records = MockRecords::new();
        records
            .expect_fetch()
            .returning(move |_| Ok(Some(record.clone())));
        let cache = Arc::new(MemoryCache::default());
        cache
            .store(&Draft::from_parts(field_map([("gender", "woman")]), 1, 5))
            .await
            .unwrap();
        let sync = ProfileSynchronizer::new(Arc::new(records)).with_local_cache(cache);

        let draft = sync.load_progress(Some(&user()), 5).await.unwrap();

        assert_eq!(draft.current_step(), 3);
        assert_eq!(draft.fields(), &field_map([("name", "Alex")]));
    }
}
