//! Fatal errors raised before any pipeline starts.

use crate::storage::StorageError;
use thiserror::Error;

/// Startup failure; the process exits with a descriptive message.
#[derive(Error, Debug)]
pub enum SetupError {
    /// The configuration file could not be read or parsed.
    #[error("reading config \"{path}\": {source}")]
    Config {
        /// Path given on the command line.
        path: String,
        /// Underlying loader error.
        #[source]
        source: config::ConfigError,
    },
    /// `db.path` is empty.
    #[error("missing database path")]
    MissingDatabasePath,
    /// No usable Telegram key was configured.
    #[error("no telegram accounts")]
    NoAccounts,
    /// A bot account failed to log in.
    #[error("telegram key ({index}) login: {reason}")]
    Login {
        /// Position of the key in the configuration.
        index: usize,
        /// Reason reported by the transport.
        reason: String,
    },
    /// Opening the database or creating the schema failed.
    #[error("database schema: {0}")]
    Storage(#[from] StorageError),
}
