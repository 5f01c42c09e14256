//! Read-through cache of per-chat settings.
//!
//! Entries are only ever filled from the store and evicted after a successful
//! write; they are never patched in place.

use crate::model::ChatSettings;
use crate::storage::{StorageError, SwapStore};
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

/// Default number of chats kept in memory.
pub const SETTINGS_CACHE_MAX_SIZE: u64 = 10_000;
/// Default time an unused entry stays cached.
pub const SETTINGS_CACHE_IDLE_SECS: u64 = 3600;

/// Settings cache keyed by chat id.
#[derive(Clone)]
pub struct SettingsCache {
    cache: Cache<i64, ChatSettings>,
}

impl Default for SettingsCache {
    fn default() -> Self {
        Self::new(SETTINGS_CACHE_MAX_SIZE, SETTINGS_CACHE_IDLE_SECS)
    }
}

impl SettingsCache {
    /// Create a cache holding at most `max_capacity` chats, each for at most
    /// `idle_secs` since its last read.
    #[must_use]
    pub fn new(max_capacity: u64, idle_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_idle(Duration::from_secs(idle_secs))
            .build();
        Self { cache }
    }

    /// Settings of `chat_id`, loaded from `store` on a miss.
    ///
    /// # Errors
    ///
    /// Returns the store error when the entry is missing and the load fails;
    /// nothing is cached in that case.
    pub async fn get(
        &self,
        store: &dyn SwapStore,
        chat_id: i64,
    ) -> Result<ChatSettings, StorageError> {
        if let Some(settings) = self.cache.get(&chat_id).await {
            return Ok(settings);
        }
        let settings = store.get_settings(chat_id).await?;
        debug!(chat_id, "Loaded chat settings into cache");
        self.cache.insert(chat_id, settings).await;
        Ok(settings)
    }

    /// Cached settings of `chat_id` without touching the store.
    #[cfg(test)]
    pub(crate) async fn peek(&self, chat_id: i64) -> Option<ChatSettings> {
        self.cache.get(&chat_id).await
    }

    /// Drop the entry for `chat_id`.
    pub async fn evict(&self, chat_id: i64) {
        self.cache.invalidate(&chat_id).await;
    }
}
