#![deny(missing_docs)]
//! Sticker Swapper core library.
//!
//! Transport-agnostic logic for the swap bot: event classification, per-chat
//! admission control, per-user interaction state, settings caching,
//! persistence and the handlers that turn inbound events into deliverables.

/// Event classification.
pub mod classifier;
/// Configuration management.
pub mod config;
/// Startup errors.
pub mod error;
/// Per-route business logic.
pub mod handlers;
/// Per-user private chat state machine storage.
pub mod interaction;
/// Per-chat fixed-window admission control.
pub mod limiter;
/// Inbound events, outbound deliverables and persisted records.
pub mod model;
/// Read-through cache over persisted chat settings.
pub mod settings_cache;
/// Shared state boundary used by every pipeline.
pub mod state;
/// Persistence contract and the SQLite store.
pub mod storage;
/// Chat transport contract and outbound queue.
pub mod transport;

#[cfg(test)]
pub mod testing;

pub use classifier::{classify, Route};
pub use error::SetupError;
pub use handlers::Dispatcher;
pub use model::{ChatSettings, Deliverable, InboundEvent, Media};
pub use state::SharedState;
pub use storage::{SqliteStore, StorageError, SwapStore};
pub use transport::{ChatTransport, Outbox, TransportError};
