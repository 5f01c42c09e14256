//! Process-wide state shared by every bot account.
//!
//! Each map sits behind its own lock and is reachable only through its
//! accessors; no accessor holds more than one of these locks at a time.

use crate::interaction::InteractionStates;
use crate::limiter::RateLimiter;
use crate::settings_cache::SettingsCache;

/// Limiter windows, pending user actions and cached chat settings.
#[derive(Default)]
pub struct SharedState {
    /// Per-chat admission windows.
    pub limiter: RateLimiter,
    /// Per-user pending private chat actions.
    pub interactions: InteractionStates,
    /// Per-chat settings cache.
    pub settings: SettingsCache,
}

impl SharedState {
    /// Empty state with default cache sizing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
