//! Configuration management for labtest.
//!
//! Configuration is layered with figment: built-in defaults, then a TOML
//! file, then `LABTEST_` environment variables.

use std::fmt;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "labtest";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "records.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `LABTEST_`, sections separated by `__`)
/// 2. TOML config file at `~/.config/labtest/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Registration form rules.
    pub registration: RegistrationConfig,
    /// Administrative actions.
    pub admin: AdminConfig,
}

/// Which key-value backend holds the records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// `SQLite` file at [`Config::database_path`].
    #[default]
    Sqlite,
    /// Process memory; nothing survives the command.
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend to use.
    pub backend: StorageBackend,
    /// Path to the database file.
    /// Defaults to `~/.local/share/labtest/records.db`
    pub database_path: Option<PathBuf>,
}

/// Rules applied to registration forms before records are saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Largest number of concrete specimens one form may register.
    pub max_specimens: u64,
    /// Refuse soil samples dated before today.
    pub reject_past_dates: bool,
}

/// Administrative configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Code that must be supplied to `records clear`. No code when unset.
    pub clear_code: Option<String>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            max_specimens: 5,
            reject_past_dates: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing, or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("LABTEST_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.registration.max_specimens == 0 {
            return Err(Error::ConfigValidation {
                message: "max_specimens must be at least 1".to_string(),
            });
        }

        if let Some(code) = &self.admin.clear_code {
            if code.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "clear_code must not be blank; remove it to disable the check"
                        .to_string(),
                });
            }
        }

        if self.storage.backend == StorageBackend::Sqlite
            && self
                .storage
                .database_path
                .as_ref()
                .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(Error::ConfigValidation {
                message: "database_path must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "labtest_config_{name}_{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert!(config.storage.database_path.is_none());
        assert_eq!(config.registration.max_specimens, 5);
        assert!(config.registration.reject_past_dates);
        assert!(config.admin.clear_code.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_max_specimens() {
        let mut config = Config::default();
        config.registration.max_specimens = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_specimens"));
    }

    #[test]
    fn test_validate_blank_clear_code() {
        let mut config = Config::default();
        config.admin.clear_code = Some("  ".to_string());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("clear_code"));
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::new());
        assert!(config.validate().is_err());

        config.storage.backend = StorageBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_path_default() {
        let path = Config::default().database_path();
        assert!(path.to_string_lossy().contains("records.db"));
        assert!(path.to_string_lossy().contains("labtest"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/srv/lab/records.db"));

        assert_eq!(config.database_path(), PathBuf::from("/srv/lab/records.db"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("labtest"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_toml_overrides() {
        let path = write_temp_config(
            "overrides",
            r#"
[storage]
backend = "memory"

[registration]
max_specimens = 3
reject_past_dates = false

[admin]
clear_code = "010324"
"#,
        );

        let config = Config::load_from(Some(path.clone())).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.registration.max_specimens, 3);
        assert!(!config.registration.reject_past_dates);
        assert_eq!(config.admin.clear_code.as_deref(), Some("010324"));
    }

    #[test]
    fn test_load_rejects_invalid_toml_values() {
        let path = write_temp_config(
            "invalid",
            r"
[registration]
max_specimens = 0
",
        );

        let result = Config::load_from(Some(path.clone()));
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_load_rejects_unknown_backend() {
        let path = write_temp_config(
            "backend",
            r#"
[storage]
backend = "postgres"
"#,
        );

        let result = Config::load_from(Some(path.clone()));
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(Error::ConfigLoad(_))));
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(StorageBackend::Sqlite.to_string(), "sqlite");
        assert_eq!(StorageBackend::Memory.to_string(), "memory");
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("\"backend\":\"sqlite\""));
        assert!(json.contains("max_specimens"));
    }

    #[test]
    fn test_registration_config_deserialize() {
        let json = r#"{"max_specimens": 2}"#;
        let registration: RegistrationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(registration.max_specimens, 2);
        assert!(registration.reject_past_dates);
    }
}
