//! Schema versioning for the `SQLite` store.
//!
//! Each entry in [`MIGRATIONS`] brings the database from `version - 1` to
//! `version`. The applied version is tracked in the `metadata` table.

use rusqlite::{Connection, OptionalExtension};

use super::schema::{CREATE_KV_TABLE, CREATE_METADATA_TABLE};
use crate::error::StorageError;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// A numbered schema step.
struct Migration {
    version: i32,
    statements: &'static [&'static str],
}

/// All migrations, in ascending version order.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    statements: &[CREATE_KV_TABLE],
}];

/// The schema version this build expects.
pub const CURRENT_VERSION: i32 = 1;

/// Bring the database up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if the stored version is unreadable or newer than this
/// build, or if a migration statement fails.
pub fn initialize_schema(conn: &mut Connection) -> Result<(), StorageError> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(StorageError::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > version) {
        let tx = conn.transaction()?;
        for statement in migration.statements {
            tx.execute(statement, [])?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            (VERSION_KEY, migration.version.to_string()),
        )?;
        tx.commit()?;
        tracing::debug!("Applied schema migration {}", migration.version);
    }

    Ok(())
}

/// The applied schema version, 0 for a fresh database.
fn schema_version(conn: &Connection) -> Result<i32, StorageError> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| StorageError::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Connection {
        Connection::open_in_memory().expect("failed to create in-memory database")
    }

    fn table_exists(conn: &Connection, name: &str) -> bool {
        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |row| row.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn test_initialize_creates_tables() {
        let mut conn = create_test_db();
        initialize_schema(&mut conn).unwrap();
        assert!(table_exists(&conn, "kv"));
        assert!(table_exists(&conn, "metadata"));
    }

    #[test]
    fn test_initialize_sets_version() {
        let mut conn = create_test_db();
        initialize_schema(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut conn = create_test_db();
        initialize_schema(&mut conn).unwrap();
        initialize_schema(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_fresh_database_version_zero() {
        let conn = create_test_db();
        conn.execute(CREATE_METADATA_TABLE, []).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_rejects_newer_schema() {
        let mut conn = create_test_db();
        conn.execute(CREATE_METADATA_TABLE, []).unwrap();
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES (?1, ?2)",
            (VERSION_KEY, "99"),
        )
        .unwrap();

        let err = initialize_schema(&mut conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_rejects_garbage_version() {
        let mut conn = create_test_db();
        conn.execute(CREATE_METADATA_TABLE, []).unwrap();
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES (?1, ?2)",
            (VERSION_KEY, "one"),
        )
        .unwrap();

        let err = initialize_schema(&mut conn).unwrap_err();
        assert!(err.to_string().contains("invalid schema version"));
    }

    #[test]
    fn test_migrations_are_ordered_and_end_at_current() {
        let versions: Vec<i32> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        assert_eq!(versions, sorted);
        assert_eq!(versions.last().copied(), Some(CURRENT_VERSION));
    }
}
