#![deny(missing_docs)]
//! Telegram transport adapter for Sticker Swapper.

/// Telegram update conversion.
pub mod convert;
/// Bot API retry helper.
pub mod retry;
/// Telegram transport implementation.
pub mod transport;

pub use transport::TelegramTransport;
