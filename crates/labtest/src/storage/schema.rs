//! `SQLite` schema for the key-value store.

/// Key-value pairs written by the record sequencer.
pub const CREATE_KV_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// Store-internal bookkeeping (schema version), kept apart from user keys.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Upsert one key.
pub const UPSERT_KV: &str = r"
INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
";

/// Read one key.
pub const SELECT_KV: &str = "SELECT value FROM kv WHERE key = ?1";

/// Delete one key.
pub const DELETE_KV: &str = "DELETE FROM kv WHERE key = ?1";
