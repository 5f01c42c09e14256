//! Configuration and settings management
//!
//! Loads settings from the file given on the command line, with environment
//! overrides (`SWAPPER__DB__PATH=/var/lib/swapper.db`, ...).

use crate::error::SetupError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration printed by `swapper -d`.
pub const DEFAULT_CONFIG: &str = r#"{
    "db": {
        "path": "swapper.db",
        "timeout": 180
    },
    "log": {
        "file": "swapper.log",
        "level": "info"
    },
    "telegram_key": ""
}
"#;

/// Telegram bot tokens: a single key or a list of keys, one per account.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum TelegramKeys {
    /// One bot account.
    One(String),
    /// Several bot accounts sharing the same state.
    Many(Vec<String>),
}

impl Default for TelegramKeys {
    fn default() -> Self {
        Self::One(String::new())
    }
}

impl TelegramKeys {
    /// Non-empty tokens, in configuration order.
    #[must_use]
    pub fn tokens(&self) -> Vec<&str> {
        let all: Vec<&str> = match self {
            Self::One(key) => vec![key.as_str()],
            Self::Many(keys) => keys.iter().map(String::as_str).collect(),
        };
        all.into_iter()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .collect()
    }
}

/// Database settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseSettings {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: String,
    /// Seconds to wait on a locked database.
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            timeout: default_database_timeout(),
        }
    }
}

impl DatabaseSettings {
    /// Busy timeout as a duration.
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn default_database_path() -> String {
    "swapper.db".to_string()
}

const fn default_database_timeout() -> u64 {
    180
}

/// Logging settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// File that receives a copy of the console log, appended to.
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LogSettings {
    /// Log file path, `None` when unset or blank.
    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.file
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(Path::new)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application settings
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SwapperConfig {
    /// Telegram bot token(s).
    #[serde(default)]
    pub telegram_key: TelegramKeys,
    /// Database settings.
    #[serde(default, rename = "db")]
    pub database: DatabaseSettings,
    /// Logging settings.
    #[serde(default)]
    pub log: LogSettings,
}

impl SwapperConfig {
    /// Load settings from `path`, then apply `SWAPPER__*` environment overrides.
    ///
    /// The file format follows the extension (`.json`, `.toml`, `.yaml`).
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Config`] if the file is missing or malformed.
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let wrap = |source| SetupError::Config {
            path: path.display().to_string(),
            source,
        };
        Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix("SWAPPER")
                    .separator("__")
                    .ignore_empty(true),
            )
            .build()
            .map_err(wrap)?
            .try_deserialize()
            .map_err(wrap)
    }

    /// Validate the loaded settings.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn check(&self) -> Result<(), SetupError> {
        if self.database.path.trim().is_empty() {
            return Err(SetupError::MissingDatabasePath);
        }
        if self.telegram_key.tokens().is_empty() {
            return Err(SetupError::NoAccounts);
        }
        Ok(())
    }
}
