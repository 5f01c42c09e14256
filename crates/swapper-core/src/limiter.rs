//! Per-chat swap admission control.
//!
//! A fixed-window counter: each chat gets `limit` swaps per window of
//! `window_seconds`, counted from the first admitted swap of the window. Up to
//! `2 × limit` swaps can land close together across a window boundary; that
//! is the expected behavior of the admin-facing "N swaps per T seconds" knob.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// Live admission window of a single chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// Instant the window closes, `None` before the first admission.
    pub window_end: Option<Instant>,
    /// Swaps allowed in this window.
    pub limit: u16,
    /// Window length the chat is configured with, in seconds.
    pub window_seconds: u16,
    /// Swaps admitted so far in this window.
    pub used: u16,
}

impl RateWindow {
    const fn closed() -> Self {
        Self {
            window_end: None,
            limit: 0,
            window_seconds: 0,
            used: 0,
        }
    }

    fn expired(&self, now: Instant) -> bool {
        self.window_end.map_or(true, |end| now >= end)
    }
}

/// Window map keyed by chat id.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: RwLock<HashMap<i64, RateWindow>>,
}

impl RateLimiter {
    /// Create an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a swap in `chat_id` may happen now.
    pub fn admit(&self, chat_id: i64, limit: u16, window_seconds: u16) -> bool {
        self.admit_at(chat_id, limit, window_seconds, Instant::now())
    }

    /// [`RateLimiter::admit`] against an explicit clock reading.
    pub fn admit_at(&self, chat_id: i64, limit: u16, window_seconds: u16, now: Instant) -> bool {
        if limit == 0 {
            return true;
        }
        let mut windows = self.windows.write().unwrap_or_else(PoisonError::into_inner);
        let window = windows.entry(chat_id).or_insert_with(RateWindow::closed);
        if window.expired(now) {
            window.used = 1;
            window.limit = limit;
            window.window_seconds = window_seconds;
            window.window_end = Some(now + Duration::from_secs(u64::from(window_seconds)));
            return true;
        }
        if window.used >= window.limit {
            return false;
        }
        window.used += 1;
        true
    }

    /// Record the chat's current configuration.
    ///
    /// A live window keeps the limit and length it was opened with. Once it
    /// has expired, `limit` and `window_seconds` are stored and the counter
    /// is cleared, so [`RateLimiter::window`] reports what the next window
    /// will be opened with.
    pub fn refresh(&self, chat_id: i64, limit: u16, window_seconds: u16) {
        self.refresh_at(chat_id, limit, window_seconds, Instant::now());
    }

    /// [`RateLimiter::refresh`] against an explicit clock reading.
    pub fn refresh_at(&self, chat_id: i64, limit: u16, window_seconds: u16, now: Instant) {
        let mut windows = self.windows.write().unwrap_or_else(PoisonError::into_inner);
        let window = windows.entry(chat_id).or_insert_with(RateWindow::closed);
        if window.expired(now) {
            window.limit = limit;
            window.window_seconds = window_seconds;
            window.used = 0;
            window.window_end = None;
        }
    }

    /// Drop the chat's window so the next admission opens a fresh one.
    pub fn reset(&self, chat_id: i64) {
        self.windows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&chat_id);
    }

    /// Copy of the chat's current window.
    #[must_use]
    pub fn window(&self, chat_id: i64) -> Option<RateWindow> {
        self.windows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&chat_id)
            .copied()
    }
}
