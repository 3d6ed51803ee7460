//! File-backed storage under a cache directory.

use std::path::PathBuf;

use async_trait::async_trait;

use super::{SessionStore, StorageError};

/// `SessionStore` persisting each key as a small JSON file.
///
/// Entries live at `<dir>/<key>.json`; the value is stored JSON-encoded so
/// arbitrary strings round-trip. This is the browser-storage analogue for
/// desktop targets without a keychain.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Create a store under the platform cache directory for `app_name`.
    pub fn in_default_location(app_name: &str) -> Result<Self, StorageError> {
        let base = dirs::cache_dir().ok_or_else(|| {
            StorageError::Unavailable("could not find cache directory".to_string())
        })?;
        Self::new(base.join(app_name))
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let value: String = serde_json::from_str(&contents)?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let contents = serde_json::to_string(value)?;
        std::fs::write(self.entry_path(key), contents)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.entry_path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        assert_eq!(store.get("last_auth_time").await.unwrap(), None);

        store.set("last_auth_time", "1700000000000").await.unwrap();
        assert_eq!(
            store.get("last_auth_time").await.unwrap().as_deref(),
            Some("1700000000000")
        );

        store.remove("last_auth_time").await.unwrap();
        assert_eq!(store.get("last_auth_time").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_survive_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::new(dir.path().to_path_buf()).unwrap();
            store.set("auth_pin", "123456").await.unwrap();
        }

        let reopened = FileStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            reopened.get("auth_pin").await.unwrap().as_deref(),
            Some("123456")
        );
    }

    #[tokio::test]
    async fn test_remove_absent_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        store.remove("never_set").await.unwrap();
    }
}
