//! Runtime configuration for opening the shared database and logging.
//!
//! # Responsibility
//! - Parse JSON configuration into [`OrmConfig`].
//! - Turn a configuration into a ready [`Database`] handle.
//!
//! # Invariants
//! - A configuration without `database` cannot open a handle; this surfaces
//!   as a configuration error, never as a default location.

use crate::db::{open::open_with, Database, DEFAULT_BUSY_TIMEOUT_MS};
use crate::record::error::{OrmError, OrmResult};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Sentinel `database` value selecting a private in-memory database.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Settings for the shared connection and the log sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrmConfig {
    /// SQLite file path, or `":memory:"`.
    pub database: Option<String>,
    pub busy_timeout_ms: u64,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files.
    pub log_dir: Option<String>,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            database: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            log_level: None,
            log_dir: None,
        }
    }
}

impl OrmConfig {
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Opens the configured database.
    ///
    /// # Errors
    /// - `Configuration` when `database` is unset or blank.
    /// - `Db` when SQLite cannot open or configure the connection.
    pub fn open_database(&self) -> OrmResult<Database> {
        let target = self
            .database
            .as_deref()
            .map(str::trim)
            .filter(|target| !target.is_empty())
            .ok_or_else(|| OrmError::Configuration("no database configured".to_string()))?;

        let db = if target == IN_MEMORY_DATABASE {
            open_with(Connection::open_in_memory(), "memory", self.busy_timeout_ms)?
        } else {
            open_with(Connection::open(target), "file", self.busy_timeout_ms)?
        };
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, OrmConfig};
    use crate::db::DEFAULT_BUSY_TIMEOUT_MS;
    use crate::record::error::ErrorKind;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = OrmConfig::from_json_str(r#"{"database": ":memory:"}"#).unwrap();
        assert_eq!(config.database.as_deref(), Some(":memory:"));
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = OrmConfig::from_json_str(r#"{"databse": "x.db"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn open_without_database_is_configuration_error() {
        let err = OrmConfig::default().open_database().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let blank = OrmConfig {
            database: Some("  ".to_string()),
            ..OrmConfig::default()
        };
        assert_eq!(
            blank.open_database().unwrap_err().kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn in_memory_sentinel_opens_database() {
        let config = OrmConfig {
            database: Some(":memory:".to_string()),
            ..OrmConfig::default()
        };
        let db = config.open_database().unwrap();
        assert_eq!(db.statements_executed(), 0);
    }
}
