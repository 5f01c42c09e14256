//! Testing helpers: event builders and a recording transport.

use crate::model::{Chat, Deliverable, InboundEvent, InlineQuery, Media, Sender};
use crate::transport::{ChatTransport, TransportError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Sender with a username derived from the id.
#[must_use]
pub fn sender(user_id: i64) -> Sender {
    Sender {
        id: user_id,
        username: Some(format!("user{user_id}")),
        display_name: format!("User {user_id}"),
        is_bot: false,
    }
}

fn event(chat: Chat, user_id: i64, text: Option<&str>) -> InboundEvent {
    InboundEvent {
        message_id: 100,
        chat,
        sender: sender(user_id),
        text: text.map(str::to_string),
        media: None,
        inline_query: None,
        reply_to: None,
    }
}

/// Text message sent to the bot in a private chat.
#[must_use]
pub fn private_text(user_id: i64, text: &str) -> InboundEvent {
    event(
        Chat {
            id: user_id,
            private: true,
        },
        user_id,
        Some(text),
    )
}

/// Sticker sent to the bot in a private chat.
#[must_use]
pub fn private_media(user_id: i64, file_id: &str, unique_id: &str) -> InboundEvent {
    let mut ev = event(
        Chat {
            id: user_id,
            private: true,
        },
        user_id,
        None,
    );
    ev.media = Some(Media {
        file_id: file_id.to_string(),
        unique_id: unique_id.to_string(),
    });
    ev
}

/// Text message in a group chat.
#[must_use]
pub fn group_text(chat_id: i64, user_id: i64, text: &str) -> InboundEvent {
    event(
        Chat {
            id: chat_id,
            private: false,
        },
        user_id,
        Some(text),
    )
}

/// Inline query typed by `user_id`.
#[must_use]
pub fn inline_query(user_id: i64, query: &str) -> InboundEvent {
    let mut ev = event(
        Chat {
            id: user_id,
            private: true,
        },
        user_id,
        None,
    );
    ev.message_id = 0;
    ev.inline_query = Some(InlineQuery {
        id: format!("q{user_id}"),
        query: query.to_string(),
    });
    ev
}

/// Collect everything queued so far.
pub fn drain(rx: &mut mpsc::Receiver<Deliverable>) -> Vec<Deliverable> {
    let mut out = Vec::new();
    while let Ok(item) = rx.try_recv() {
        out.push(item);
    }
    out
}

/// Transport that records moderation calls and answers admin checks from a flag.
#[derive(Default)]
pub struct RecordingTransport {
    /// Whether every user counts as a chat admin.
    pub admin: AtomicBool,
    /// Whether admin lookups fail.
    pub admin_lookup_fails: AtomicBool,
    /// Whether deletes fail.
    pub delete_fails: AtomicBool,
    /// `(chat_id, message_id)` of every delete request.
    pub deleted: Mutex<Vec<(i64, i32)>>,
}

impl RecordingTransport {
    /// Transport whose users are all admins.
    #[must_use]
    pub fn admin() -> Self {
        let transport = Self::default();
        transport.admin.store(true, Ordering::SeqCst);
        transport
    }

    /// Recorded deletes.
    #[must_use]
    pub fn deleted(&self) -> Vec<(i64, i32)> {
        self.deleted
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn connect(&self) -> Result<mpsc::Receiver<InboundEvent>, TransportError> {
        Err(TransportError::Stopped)
    }

    async fn send(&self, _deliverable: Deliverable) -> Result<(), TransportError> {
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError> {
        if let Ok(mut deleted) = self.deleted.lock() {
            deleted.push((chat_id, message_id));
        }
        if self.delete_fails.load(Ordering::SeqCst) {
            return Err(TransportError::Request("not enough rights".to_string()));
        }
        Ok(())
    }

    async fn is_chat_admin(&self, _chat_id: i64, _user_id: i64) -> Result<bool, TransportError> {
        if self.admin_lookup_fails.load(Ordering::SeqCst) {
            return Err(TransportError::Request("chat not found".to_string()));
        }
        Ok(self.admin.load(Ordering::SeqCst))
    }

    async fn stop(&self) {}
}
