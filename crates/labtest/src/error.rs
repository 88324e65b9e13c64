//! Error types for labtest.
//!
//! The core knows exactly two kinds of failure: [`ValidationError`] for bad
//! numeric or form input and [`StorageError`] for a failed persistence round
//! trip. The crate-level [`Error`] wraps both, plus the configuration and I/O
//! failures of the command-line front end.

use std::path::PathBuf;
use thiserror::Error;

/// Bad, missing, or out-of-range input to a calculation or registration.
///
/// Always recoverable: the caller redisplays the form with [`ValidationError::message`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid value for '{field}': {message}")]
pub struct ValidationError {
    /// Name of the offending field.
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for the given field.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The field is absent or blank.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "a value is required")
    }

    /// The field is not a finite decimal number.
    #[must_use]
    pub fn not_a_number(field: impl Into<String>, raw: &str) -> Self {
        Self::new(field, format!("'{raw}' is not a valid number"))
    }

    /// The field must be strictly greater than zero.
    #[must_use]
    pub fn not_positive(field: impl Into<String>) -> Self {
        Self::new(field, "must be greater than zero")
    }

    /// The field must not be negative.
    #[must_use]
    pub fn negative(field: impl Into<String>) -> Self {
        Self::new(field, "must not be negative")
    }
}

/// A read or write against the key-value store failed.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// Failed to create the directory holding the database.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A stored value could not be decoded.
    #[error("stored value under '{key}' is corrupt: {source}")]
    Corrupt {
        /// Key whose value failed to decode.
        key: String,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A stored counter is not a decimal integer.
    #[error("stored counter under '{key}' is not a number: {value:?}")]
    InvalidCounter {
        /// Counter key.
        key: String,
        /// The raw stored value.
        value: String,
    },

    /// A value could not be encoded for storage.
    #[error("failed to encode value for '{key}': {source}")]
    Encode {
        /// Key being written.
        key: String,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The backing store refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Create an unavailable-store error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Generic text shown to a user when a save fails.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        "could not save the test record"
    }
}

/// The main error type for labtest operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Persistence failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// The administrative confirmation did not match.
    #[error("confirmation rejected: {0}")]
    ConfirmationRejected(String),
}

/// A specialized Result type for labtest operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Check if this error came from input validation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from the storage layer.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::not_positive("load");
        assert_eq!(
            err.to_string(),
            "invalid value for 'load': must be greater than zero"
        );
    }

    #[test]
    fn test_validation_error_names_field() {
        let err = ValidationError::not_a_number("diameter", "abc");
        assert_eq!(err.field, "diameter");
        assert!(err.message.contains("abc"));
    }

    #[test]
    fn test_missing_and_negative_messages() {
        assert!(ValidationError::missing("fc")
            .to_string()
            .contains("required"));
        assert!(ValidationError::negative("tare")
            .to_string()
            .contains("negative"));
    }

    #[test]
    fn test_error_from_validation_is_transparent() {
        let err: Error = ValidationError::not_positive("fc").into();
        assert!(err.is_validation());
        assert!(!err.is_storage());
        assert_eq!(
            err.to_string(),
            "invalid value for 'fc': must be greater than zero"
        );
    }

    #[test]
    fn test_error_from_storage() {
        let err: Error = StorageError::unavailable("disk full").into();
        assert!(err.is_storage());
        assert_eq!(err.to_string(), "storage unavailable: disk full");
    }

    #[test]
    fn test_storage_user_message_is_generic() {
        let err = StorageError::unavailable("anything");
        assert_eq!(err.user_message(), "could not save the test record");
    }

    #[test]
    fn test_invalid_counter_display() {
        let err = StorageError::InvalidCounter {
            key: "EnsayesSuelos_lastId".to_string(),
            value: "seven".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("EnsayesSuelos_lastId"));
        assert!(msg.contains("seven"));
    }

    #[test]
    fn test_corrupt_display() {
        let json_err = serde_json::from_str::<Vec<i32>>("{").unwrap_err();
        let err = StorageError::Corrupt {
            key: "EnsayesConcreto".to_string(),
            source: json_err,
        };
        assert!(err.to_string().contains("EnsayesConcreto"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: StorageError = sqlite_err.into();
            assert!(matches!(err, StorageError::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "max_specimens must be at least 1".to_string(),
        };
        assert!(err.to_string().contains("max_specimens"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
