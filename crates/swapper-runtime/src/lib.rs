#![deny(missing_docs)]
//! Sticker Swapper runtime.
//!
//! Runs one dispatch pipeline per bot account over a shared store and shared
//! in-memory state, and tears everything down on cancellation.

/// Per-account receive/send task pair.
pub mod pipeline;
/// Multi-account lifecycle controller.
pub mod swapper;

pub use pipeline::{spawn_send_task, DispatchPipeline, SHUTDOWN_GRACE};
pub use swapper::Swapper;
