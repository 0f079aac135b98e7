//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Blank variables fall back to defaults.
//! - `log_dir` is absolute and `log_level` is a supported level.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "AGENDA_DB_PATH";
pub const LOG_DIR_ENV: &str = "AGENDA_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "AGENDA_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "agenda.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "agenda-logs";

/// Configuration error surfaced before anything is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{LOG_LEVEL_ENV}: {message}"),
            Self::RelativeLogDir(path) => write!(
                f,
                "{LOG_DIR_ENV} must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Paths and levels used by the console binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: &'static str,
}

impl AgendaConfig {
    /// Reads `AGENDA_DB_PATH`, `AGENDA_LOG_DIR` and `AGENDA_LOG_LEVEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let db_path = value(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let log_dir = value(LOG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME));
        if !log_dir.is_absolute() {
            return Err(ConfigError::RelativeLogDir(log_dir));
        }

        let log_level = match value(LOG_LEVEL_ENV) {
            Some(level) => normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        Ok(Self {
            db_path,
            log_dir,
            log_level,
        })
    }
}
