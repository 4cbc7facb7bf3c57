//! File-based profile record store
//!
//! One JSON document per user under a base directory. Used when no hosted
//! backend is configured, so the CLI keeps progress across runs.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use kd_core::onboarding::{ProfileRecord, ProfileRecordPatch};
use kd_core::ports::{ProfileRecordPort, RecordStoreError};
use kd_core::UserId;

use crate::fs::{read_json, write_json_atomic};

pub struct FileProfileRecordStore {
    base_dir: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileProfileRecordStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            write_lock: Mutex::new(()),
        }
    }

    fn record_path(&self, user_id: &UserId) -> PathBuf {
        let file_name: String = user_id
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{file_name}.json"))
    }

    async fn read_record(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ProfileRecord>, RecordStoreError> {
        let path = self.record_path(user_id);
        read_json(&path)
            .await
            .map_err(|err| RecordStoreError::Corrupt(format!("{err:#}")))
    }
}

#[async_trait]
impl ProfileRecordPort for FileProfileRecordStore {
    async fn upsert(
        &self,
        user_id: &UserId,
        patch: &ProfileRecordPatch,
    ) -> Result<(), RecordStoreError> {
        let _guard = self.write_lock.lock().await;

        let record = match self.read_record(user_id).await? {
            Some(mut record) => {
                record.apply(patch);
                record
            }
            None => ProfileRecord::from_patch(user_id.clone(), patch),
        };

        let path = self.record_path(user_id);
        write_json_atomic(&path, &record)
            .await
            .map_err(|err| RecordStoreError::Storage(format!("{err:#}")))?;
        debug!(
            user_id = %user_id,
            path = %path.display(),
            step = record.onboarding_step,
            "profile record written"
        );
        Ok(())
    }

    async fn fetch(&self, user_id: &UserId) -> Result<Option<ProfileRecord>, RecordStoreError> {
        self.read_record(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kd_core::onboarding::{field_map, Draft};
    use tempfile::TempDir;

    fn patch(fields: &[(&str, &str)], step: u32) -> ProfileRecordPatch {
        ProfileRecordPatch::from_draft(&Draft::from_parts(
            field_map(fields.iter().copied()),
            step,
            5,
        ))
    }

    #[tokio::test]
    async fn test_upsert_then_fetch_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileProfileRecordStore::new(temp_dir.path().to_path_buf());
        let user = UserId::new("user-1");

        store.upsert(&user, &patch(&[("gender", "man")], 1)).await.unwrap();
        store.upsert(&user, &patch(&[("name", "Alex")], 3)).await.unwrap();

        let record = store.fetch(&user).await.unwrap().unwrap();
        assert_eq!(record.id, user);
        assert_eq!(record.onboarding_step, 3);
        assert_eq!(
            record.answered_fields(),
            field_map([("gender", "man"), ("name", "Alex")])
        );
    }

    #[tokio::test]
    async fn test_records_survive_a_new_store_instance() {
        let temp_dir = TempDir::new().unwrap();
        let user = UserId::new("user-1");
        FileProfileRecordStore::new(temp_dir.path().to_path_buf())
            .upsert(&user, &patch(&[("name", "Alex")], 3))
            .await
            .unwrap();

        let reopened = FileProfileRecordStore::new(temp_dir.path().to_path_buf());
        let record = reopened.fetch(&user).await.unwrap().unwrap();
        assert_eq!(record.onboarding_step, 3);
    }

    #[tokio::test]
    async fn test_fetch_missing_user_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileProfileRecordStore::new(temp_dir.path().to_path_buf());
        assert!(store.fetch(&UserId::new("nobody")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileProfileRecordStore::new(temp_dir.path().to_path_buf());
        let user = UserId::new("user-1");
        tokio::fs::write(store.record_path(&user), "{invalid json")
            .await
            .unwrap();

        let err = store.fetch(&user).await.unwrap_err();
        assert!(matches!(err, RecordStoreError::Corrupt(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_record_path_sanitizes_user_id() {
        let store = FileProfileRecordStore::new(PathBuf::from("/data"));
        let path = store.record_path(&UserId::new("../evil/id"));
        assert_eq!(path, PathBuf::from("/data/___evil_id.json"));
    }
}
