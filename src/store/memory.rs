//! Volatile in-memory storage.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{SessionStore, StorageError};

/// In-memory `SessionStore` fallback.
///
/// Used when no platform persistence backend is available (headless runs,
/// tests). Nothing survives process restart, so a session held here expires
/// with the process at the latest.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryStore::new();
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
    async fn test_set_replaces_existing_value() {
        let store = MemoryStore::new();
        store.set("k", "one").await.unwrap();
        store.set("k", "two").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_remove_absent_key_is_ok() {
        let store = MemoryStore::new();
        store.remove("never_set").await.unwrap();
    }
}
