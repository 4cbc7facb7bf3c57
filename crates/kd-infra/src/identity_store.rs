use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use kd_core::ports::{IdentityStoreError, IdentityStorePort};
use kd_core::UserId;

const IDENTITY_DIR: &str = "session";
const IDENTITY_FILE: &str = "identity.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredIdentity {
    user_id: UserId,
    signed_in_at: chrono::DateTime<chrono::Utc>,
}

/// Signed-in user persisted as a small JSON file under the app data root.
#[derive(Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(app_data_root: PathBuf) -> Self {
        let path = app_data_root.join(IDENTITY_DIR).join(IDENTITY_FILE);
        Self { path }
    }

    fn read_identity(&self) -> Result<Option<UserId>, IdentityStoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(IdentityStoreError::Store(format!(
                    "failed to read identity file: {err}"
                )))
            }
        };
        let stored: StoredIdentity = serde_json::from_slice(&bytes).map_err(|err| {
            IdentityStoreError::Corrupt(format!("failed to decode identity file: {err}"))
        })?;
        if !stored.user_id.is_valid() {
            return Err(IdentityStoreError::Corrupt(
                "identity file holds a blank user id".to_string(),
            ));
        }
        Ok(Some(stored.user_id))
    }

    fn write_identity(&self, user_id: &UserId) -> Result<(), IdentityStoreError> {
        let parent = self.path.parent().ok_or_else(|| {
            IdentityStoreError::Store("identity path missing parent directory".to_string())
        })?;
        std::fs::create_dir_all(parent).map_err(|err| {
            IdentityStoreError::Store(format!("failed to create identity dir: {err}"))
        })?;

        let stored = StoredIdentity {
            user_id: user_id.clone(),
            signed_in_at: chrono::Utc::now(),
        };
        let bytes = serde_json::to_vec_pretty(&stored).map_err(|err| {
            IdentityStoreError::Store(format!("failed to encode identity: {err}"))
        })?;

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, bytes).map_err(|err| {
            IdentityStoreError::Store(format!("failed to write identity temp file: {err}"))
        })?;

        std::fs::rename(&tmp_path, &self.path).map_err(|err| {
            IdentityStoreError::Store(format!("failed to commit identity file: {err}"))
        })?;

        Ok(())
    }
}

impl IdentityStorePort for FileIdentityStore {
    fn load_identity(&self) -> Result<Option<UserId>, IdentityStoreError> {
        self.read_identity()
    }

    fn store_identity(&self, user_id: &UserId) -> Result<(), IdentityStoreError> {
        self.write_identity(user_id)
    }

    fn clear_identity(&self) -> Result<(), IdentityStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(IdentityStoreError::Store(format!(
                "failed to remove identity file: {err}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_identity_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileIdentityStore::new(temp_dir.path().to_path_buf());

        assert!(store.load_identity().unwrap().is_none());

        store.store_identity(&UserId::new("user-1")).unwrap();
        assert_eq!(store.load_identity().unwrap(), Some(UserId::new("user-1")));

        store.store_identity(&UserId::new("user-2")).unwrap();
        assert_eq!(store.load_identity().unwrap(), Some(UserId::new("user-2")));
    }

    #[test]
    fn file_identity_store_clear_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileIdentityStore::new(temp_dir.path().to_path_buf());
        store.store_identity(&UserId::new("user-1")).unwrap();

        store.clear_identity().unwrap();
        store.clear_identity().unwrap();

        assert!(store.load_identity().unwrap().is_none());
    }

    #[test]
    fn file_identity_store_reports_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileIdentityStore::new(temp_dir.path().to_path_buf());
        std::fs::create_dir_all(temp_dir.path().join(IDENTITY_DIR)).unwrap();
        std::fs::write(&store.path, b"not json").unwrap();

        let err = store.load_identity().unwrap_err();
        assert!(matches!(err, IdentityStoreError::Corrupt(_)));
    }
}
