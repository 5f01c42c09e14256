//! Chat network contract used by the handlers and the dispatch pipeline.

use crate::model::{Deliverable, InboundEvent};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Capacity of the per-account outbound queue.
pub const OUTBOUND_CAPACITY: usize = 128;

/// Errors reported by a chat transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Login or connection setup failed.
    #[error("connect failed: {0}")]
    Connect(String),
    /// A request to the chat network failed.
    #[error("request failed: {0}")]
    Request(String),
    /// The transport has been stopped.
    #[error("transport stopped")]
    Stopped,
}

/// Duplex channel to one bot account on the chat network.
#[async_trait]
pub trait ChatTransport: Send + Sync + 'static {
    /// Start receiving; inbound events arrive on the returned channel until
    /// [`ChatTransport::stop`] is called.
    async fn connect(&self) -> Result<mpsc::Receiver<InboundEvent>, TransportError>;

    /// Deliver one outbound item.
    async fn send(&self, deliverable: Deliverable) -> Result<(), TransportError>;

    /// Delete a message from a chat.
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError>;

    /// Whether `user_id` administers `chat_id`.
    async fn is_chat_admin(&self, chat_id: i64, user_id: i64) -> Result<bool, TransportError>;

    /// Stop receiving and release the connection.
    async fn stop(&self);
}

/// Sending half of an account's outbound queue.
#[derive(Clone, Debug)]
pub struct Outbox {
    tx: mpsc::Sender<Deliverable>,
}

impl Outbox {
    /// Wrap the sending half of an outbound channel.
    #[must_use]
    pub const fn new(tx: mpsc::Sender<Deliverable>) -> Self {
        Self { tx }
    }

    /// Create a queue with [`OUTBOUND_CAPACITY`] slots.
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<Deliverable>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        (Self::new(tx), rx)
    }

    /// Queue `deliverable`, waiting for a free slot.
    ///
    /// Items pushed after the send task has gone away are dropped.
    pub async fn push(&self, deliverable: Deliverable) {
        if let Err(e) = self.tx.send(deliverable).await {
            debug!(deliverable = ?e.0, "Outbound queue closed; dropping deliverable");
        }
    }
}
