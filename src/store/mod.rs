//! Durable key/value persistence for session state.
//!
//! This module provides:
//! - `SessionStore`: the persistence contract the session manager writes
//!   its timestamp through
//! - `KeychainStore`: OS keychain via keyring
//! - `FileStore`: JSON files under a cache directory
//! - `MemoryStore`: volatile fallback for headless and test environments
//!
//! The host application picks a backend at construction time and hands it to
//! the manager; nothing in here inspects the platform at runtime.

pub mod file;
pub mod keychain;
pub mod memory;

pub use file::FileStore;
pub use keychain::KeychainStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("keychain error: {0}")]
    Keychain(#[from] keyring::Error),

    #[error("malformed entry: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Key/value persistence of session state.
///
/// Values are opaque strings that must round-trip through `set`/`get`.
/// Any operation may fail with a [`StorageError`]; callers decide how much
/// a failure matters (the session manager treats read failures as "no
/// session" and write failures as non-fatal).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value stored under `key`. Removing an absent key is not an
    /// error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
