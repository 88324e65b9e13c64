//! `SQLite`-backed key-value store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::migrations;
use super::schema::{DELETE_KV, SELECT_KV, UPSERT_KV};
use super::KeyValueStore;
use crate::error::StorageError;

/// Key-value store in a single `SQLite` table.
///
/// Batch writes run inside one transaction, so `set_many` and `remove_many`
/// either fully apply or leave the table untouched.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    ///
    /// Creates missing parent directories and brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created, or if
    /// schema migration fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| {
                    StorageError::DirectoryCreate {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        debug!("Opening record store at {}", path.display());
        let mut conn = Connection::open(&path).map_err(|source| StorageError::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&mut conn)?;

        info!("Record store opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let mut conn = Connection::open_in_memory().map_err(|source| StorageError::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&mut conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn.lock().await;
        let value = conn
            .query_row(SELECT_KV, [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().await;
        conn.execute(UPSERT_KV, params![key, value])?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().await;
        conn.execute(DELETE_KV, [key])?;
        Ok(())
    }

    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), StorageError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        for (key, value) in entries {
            tx.execute(UPSERT_KV, params![key, value])?;
        }
        tx.commit()?;
        debug!("Wrote {} keys", entries.len());
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        for key in keys {
            tx.execute(DELETE_KV, [key])?;
        }
        tx.commit()?;
        debug!("Removed {} keys", keys.len());
        Ok(())
    }
}
