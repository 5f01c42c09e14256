//! Persistence layer for word mappings and chat settings.
//!
//! The handlers only see the [`SwapStore`] contract; [`SqliteStore`] is the
//! bundled implementation.

use crate::model::{ChatSettings, Mapping, Media, SwapLookup};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Query or statement failure reported by SQLite
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Standard I/O error while preparing the database location
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The store could not run the request at all
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Interface for persistence providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapStore: Send + Sync {
    /// Settings of `chat_id` and the media `user_id` bound to `word`.
    ///
    /// Creates the default settings row for an unseen chat.
    async fn lookup_swap(
        &self,
        user_id: i64,
        chat_id: i64,
        word: &str,
    ) -> Result<SwapLookup, StorageError>;
    /// Media `user_id` bound to `word`
    async fn get_mapping(&self, user_id: i64, word: &str) -> Result<Option<String>, StorageError>;
    /// Words of `user_id`, ordered
    async fn list_words(&self, user_id: i64) -> Result<Vec<String>, StorageError>;
    /// Words of `user_id` bound to the media with `unique_id`
    async fn list_by_media(&self, user_id: i64, unique_id: &str)
        -> Result<Vec<String>, StorageError>;
    /// Up to `limit` mappings of `user_id` whose word starts with `prefix`
    /// (every mapping for an empty prefix)
    async fn search_mappings(
        &self,
        user_id: i64,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<Mapping>, StorageError>;
    /// Bind `word` to `media`, replacing an existing binding of the same word
    async fn upsert_mapping(
        &self,
        user_id: i64,
        word: &str,
        media: &Media,
    ) -> Result<(), StorageError>;
    /// Remove the binding of `word`; returns the number of removed rows
    async fn delete_mapping(&self, user_id: i64, word: &str) -> Result<usize, StorageError>;
    /// Remove every binding of `user_id`
    async fn delete_all_for_user(&self, user_id: i64) -> Result<usize, StorageError>;
    /// Remove every binding of `user_id` to the media with `unique_id`
    async fn delete_by_media(&self, user_id: i64, unique_id: &str) -> Result<usize, StorageError>;
    /// Settings of `chat_id`, defaults for an unseen chat
    async fn get_settings(&self, chat_id: i64) -> Result<ChatSettings, StorageError>;
    /// Set the swap limit of `chat_id`
    async fn set_limit(&self, chat_id: i64, limit: u16) -> Result<(), StorageError>;
    /// Set the window length of `chat_id`
    async fn set_timeout(&self, chat_id: i64, seconds: u16) -> Result<(), StorageError>;
    /// Set whether swapped messages are deleted in `chat_id`
    async fn set_auto_delete(&self, chat_id: i64, enabled: bool) -> Result<(), StorageError>;
    /// Set the master switch of `chat_id`
    async fn set_enabled(&self, chat_id: i64, enabled: bool) -> Result<(), StorageError>;
}

const CLEAN_STATEMENTS: &str = "
    DROP TABLE IF EXISTS mappings;
    DROP TABLE IF EXISTS settings;
";

const SETUP_STATEMENTS: &str = "
    CREATE TABLE IF NOT EXISTS mappings (
        swap_id   INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id   INTEGER NOT NULL,
        keyword   TEXT NOT NULL COLLATE NOCASE,
        media_id  TEXT NOT NULL,
        media_uid TEXT,
        UNIQUE (user_id, keyword)
    );
    CREATE INDEX IF NOT EXISTS mappings_by_media ON mappings (user_id, media_uid);
    CREATE TABLE IF NOT EXISTS settings (
        chat_id      INTEGER PRIMARY KEY,
        swap_limit   INTEGER NOT NULL DEFAULT 5,
        swap_timeout INTEGER NOT NULL DEFAULT 5,
        auto_delete  INTEGER NOT NULL DEFAULT 1,
        enabled      INTEGER NOT NULL DEFAULT 1
    );
";

/// Settings columns writable through the admin commands.
#[derive(Debug, Clone, Copy)]
enum SettingColumn {
    Limit,
    Timeout,
    AutoDelete,
    Enabled,
}

impl SettingColumn {
    const fn name(self) -> &'static str {
        match self {
            Self::Limit => "swap_limit",
            Self::Timeout => "swap_timeout",
            Self::AutoDelete => "auto_delete",
            Self::Enabled => "enabled",
        }
    }
}

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and set up the schema.
    ///
    /// With `clear` set, every table is dropped before the schema is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema setup fails.
    pub fn open(path: &Path, busy_timeout: Duration, clear: bool) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        let store = Self::setup(conn, clear)?;
        info!("Swap store opened: {}", path.display());
        Ok(store)
    }

    /// In-memory database, used by tests and dry runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema setup fails.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::setup(Connection::open_in_memory()?, false)
    }

    fn setup(conn: Connection, clear: bool) -> Result<Self, StorageError> {
        if clear {
            info!("Clearing all stored mappings and settings");
            conn.execute_batch(CLEAN_STATEMENTS)?;
        }
        conn.execute_batch(SETUP_STATEMENTS)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn call<F, R>(&self, f: F) -> Result<R, StorageError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard).map_err(StorageError::from)
        })
        .await
        .map_err(|e| StorageError::Unavailable(e.to_string()))?
    }

    async fn set_column(
        &self,
        chat_id: i64,
        column: SettingColumn,
        value: i64,
    ) -> Result<(), StorageError> {
        let sql = format!(
            "INSERT INTO settings (chat_id, {col}) VALUES (?1, ?2)
             ON CONFLICT (chat_id) DO UPDATE SET {col} = excluded.{col}",
            col = column.name()
        );
        self.call(move |conn| conn.execute(&sql, params![chat_id, value]))
            .await?;
        debug!(chat_id, column = column.name(), value, "Updated chat setting");
        Ok(())
    }
}

fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl SwapStore for SqliteStore {
    async fn lookup_swap(
        &self,
        user_id: i64,
        chat_id: i64,
        word: &str,
    ) -> Result<SwapLookup, StorageError> {
        let word = word.to_string();
        self.call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR IGNORE INTO settings (chat_id) VALUES (?1)",
                params![chat_id],
            )?;
            let lookup = tx.query_row(
                "SELECT enabled, swap_limit, swap_timeout, auto_delete,
                        (SELECT media_id FROM mappings WHERE user_id = ?2 AND keyword = ?3 LIMIT 1)
                 FROM settings WHERE chat_id = ?1",
                params![chat_id, user_id, word],
                |row| {
                    Ok(SwapLookup {
                        settings: ChatSettings {
                            enabled: row.get(0)?,
                            limit: row.get(1)?,
                            window_seconds: row.get(2)?,
                            auto_delete: row.get(3)?,
                        },
                        file_id: row.get::<_, Option<String>>(4)?.filter(|id| !id.is_empty()),
                    })
                },
            )?;
            tx.commit()?;
            Ok(lookup)
        })
        .await
    }

    async fn get_mapping(&self, user_id: i64, word: &str) -> Result<Option<String>, StorageError> {
        let word = word.to_string();
        self.call(move |conn| {
            conn.query_row(
                "SELECT media_id FROM mappings WHERE user_id = ?1 AND keyword = ?2",
                params![user_id, word],
                |row| row.get(0),
            )
            .optional()
        })
        .await
    }

    async fn list_words(&self, user_id: i64) -> Result<Vec<String>, StorageError> {
        self.call(move |conn| {
            let mut stmt =
                conn.prepare("SELECT keyword FROM mappings WHERE user_id = ?1 ORDER BY keyword")?;
            let words = stmt
                .query_map(params![user_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(words)
        })
        .await
    }

    async fn list_by_media(
        &self,
        user_id: i64,
        unique_id: &str,
    ) -> Result<Vec<String>, StorageError> {
        let unique_id = unique_id.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT keyword FROM mappings WHERE user_id = ?1 AND media_uid = ?2 ORDER BY keyword",
            )?;
            let words = stmt
                .query_map(params![user_id, unique_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(words)
        })
        .await
    }

    async fn search_mappings(
        &self,
        user_id: i64,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<Mapping>, StorageError> {
        let pattern = like_prefix(prefix);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT keyword, media_id FROM mappings
                 WHERE user_id = ?1 AND keyword LIKE ?2 ESCAPE '\\'
                 ORDER BY keyword LIMIT ?3",
            )?;
            let mappings = stmt
                .query_map(params![user_id, pattern, limit], |row| {
                    Ok(Mapping {
                        word: row.get(0)?,
                        file_id: row.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<Mapping>>>()?;
            Ok(mappings)
        })
        .await
    }

    async fn upsert_mapping(
        &self,
        user_id: i64,
        word: &str,
        media: &Media,
    ) -> Result<(), StorageError> {
        let word = word.to_string();
        let media = media.clone();
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO mappings (user_id, keyword, media_id, media_uid)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, keyword)
                 DO UPDATE SET media_id = excluded.media_id, media_uid = excluded.media_uid",
                params![user_id, word, media.file_id, media.unique_id],
            )
        })
        .await?;
        Ok(())
    }

    async fn delete_mapping(&self, user_id: i64, word: &str) -> Result<usize, StorageError> {
        let word = word.to_string();
        self.call(move |conn| {
            conn.execute(
                "DELETE FROM mappings WHERE user_id = ?1 AND keyword = ?2",
                params![user_id, word],
            )
        })
        .await
    }

    async fn delete_all_for_user(&self, user_id: i64) -> Result<usize, StorageError> {
        self.call(move |conn| {
            conn.execute("DELETE FROM mappings WHERE user_id = ?1", params![user_id])
        })
        .await
    }

    async fn delete_by_media(&self, user_id: i64, unique_id: &str) -> Result<usize, StorageError> {
        let unique_id = unique_id.to_string();
        self.call(move |conn| {
            conn.execute(
                "DELETE FROM mappings WHERE user_id = ?1 AND media_uid = ?2",
                params![user_id, unique_id],
            )
        })
        .await
    }

    async fn get_settings(&self, chat_id: i64) -> Result<ChatSettings, StorageError> {
        let settings = self
            .call(move |conn| {
                conn.query_row(
                    "SELECT enabled, swap_limit, swap_timeout, auto_delete
                     FROM settings WHERE chat_id = ?1",
                    params![chat_id],
                    |row| {
                        Ok(ChatSettings {
                            enabled: row.get(0)?,
                            limit: row.get(1)?,
                            window_seconds: row.get(2)?,
                            auto_delete: row.get(3)?,
                        })
                    },
                )
                .optional()
            })
            .await?;
        Ok(settings.unwrap_or_default())
    }

    async fn set_limit(&self, chat_id: i64, limit: u16) -> Result<(), StorageError> {
        self.set_column(chat_id, SettingColumn::Limit, i64::from(limit))
            .await
    }

    async fn set_timeout(&self, chat_id: i64, seconds: u16) -> Result<(), StorageError> {
        self.set_column(chat_id, SettingColumn::Timeout, i64::from(seconds))
            .await
    }

    async fn set_auto_delete(&self, chat_id: i64, enabled: bool) -> Result<(), StorageError> {
        self.set_column(chat_id, SettingColumn::AutoDelete, i64::from(enabled))
            .await
    }

    async fn set_enabled(&self, chat_id: i64, enabled: bool) -> Result<(), StorageError> {
        self.set_column(chat_id, SettingColumn::Enabled, i64::from(enabled))
            .await
    }
}
