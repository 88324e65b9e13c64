//! Key-value persistence for test records.
//!
//! The record sequencer only needs string get/set/remove over string keys; it
//! JSON-encodes values itself. [`KeyValueStore`] is that seam. Two backends
//! ship with the crate:
//!
//! - [`MemoryStore`]: a process-local map, used by tests and `backend = "memory"`.
//! - [`SqliteStore`]: a single `SQLite` table, the default on-device store.

mod migrations;
mod schema;
mod sqlite;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;

pub use sqlite::SqliteStore;

/// Asynchronous string key-value storage.
///
/// Absent keys read as `None`. `set_many` and `remove_many` must apply all of
/// their entries or none of them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short name of the backend, for logs and status output.
    fn backend_name(&self) -> &'static str;

    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Store several entries atomically.
    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), StorageError>;

    /// Delete several keys atomically.
    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key).await
    }

    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), StorageError> {
        (**self).set_many(entries).await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        (**self).remove_many(keys).await
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key).await
    }

    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), StorageError> {
        (**self).set_many(entries).await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        (**self).remove_many(keys).await
    }
}

/// In-memory store. Contents are lost when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Copy of everything currently stored.
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), StorageError> {
        let mut map = self.entries.lock().await;
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut map = self.entries.lock().await;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}
