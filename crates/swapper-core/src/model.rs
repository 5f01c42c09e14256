//! Plain data carried between the transport, the handlers and the store.

use serde::{Deserialize, Serialize};

/// Identity of the account that sent an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// Network user id.
    pub id: i64,
    /// Public username without the leading `@`, if the user has one.
    pub username: Option<String>,
    /// Full display name.
    pub display_name: String,
    /// Whether the sender is a bot account.
    pub is_bot: bool,
}

impl Sender {
    /// Name used in attribution messages: `@username` or the display name.
    #[must_use]
    pub fn mention(&self) -> String {
        match self.username.as_deref() {
            Some(name) if !name.is_empty() => format!("@{name}"),
            _ => self.display_name.clone(),
        }
    }
}

/// Conversation an event arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chat {
    /// Network chat id.
    pub id: i64,
    /// `true` for one-to-one conversations with the bot.
    pub private: bool,
}

/// A media item as referenced by the chat network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Id usable to re-send the media.
    pub file_id: String,
    /// Stable id of the underlying file, identical across bots.
    pub unique_id: String,
}

/// Payload of an inline search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineQuery {
    /// Id the answer has to reference.
    pub id: String,
    /// Raw search term typed by the user.
    pub query: String,
}

/// One inbound event received from a bot account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Id of the message inside its chat (zero for inline queries).
    pub message_id: i32,
    /// Conversation the event belongs to.
    pub chat: Chat,
    /// Who sent it.
    pub sender: Sender,
    /// Message text, if any.
    pub text: Option<String>,
    /// Attached media, if any.
    pub media: Option<Media>,
    /// Inline search payload, if the event is an inline query.
    pub inline_query: Option<InlineQuery>,
    /// Id of the message this one replies to.
    pub reply_to: Option<i32>,
}

impl InboundEvent {
    /// Message text or the empty string.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// Single entry of an inline answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineResult {
    /// Result id, unique inside one answer.
    pub id: String,
    /// Keyword the media is bound to.
    pub title: String,
    /// Media to share when the result is picked.
    pub file_id: String,
}

/// Button shown above an inline answer that opens a private chat with the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchPrivateHint {
    /// Button label.
    pub text: String,
    /// Payload passed along with the `/start` command.
    pub start_parameter: String,
}

/// Outbound item queued for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deliverable {
    /// Plain text message.
    Text {
        /// Destination chat.
        chat_id: i64,
        /// Message body.
        text: String,
        /// Message to thread the reply to.
        reply_to: Option<i32>,
    },
    /// Re-share of a stored media item.
    MediaShare {
        /// Destination chat.
        chat_id: i64,
        /// Media to share.
        file_id: String,
        /// Message to thread the reply to.
        reply_to: Option<i32>,
    },
    /// Answer to an inline query.
    InlineAnswer {
        /// Query being answered.
        query_id: String,
        /// Results, possibly empty.
        results: Vec<InlineResult>,
        /// Button pointing the user to a private chat.
        switch_private: Option<SwitchPrivateHint>,
    },
}

impl Deliverable {
    /// Plain text message without threading.
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self::Text {
            chat_id,
            text: text.into(),
            reply_to: None,
        }
    }

    /// Plain text message threaded to `reply_to`.
    pub fn reply(chat_id: i64, reply_to: i32, text: impl Into<String>) -> Self {
        Self::Text {
            chat_id,
            text: text.into(),
            reply_to: Some(reply_to),
        }
    }
}

/// Per-chat settings tuned by group administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Master switch for swapping in the chat.
    pub enabled: bool,
    /// Swaps allowed per window, zero disables limiting.
    pub limit: u16,
    /// Window length in seconds.
    pub window_seconds: u16,
    /// Try to delete the message that triggered a swap.
    pub auto_delete: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 5,
            window_seconds: 5,
            auto_delete: true,
        }
    }
}

/// Result of a substitution lookup: chat settings plus the user's media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapLookup {
    /// Current settings of the chat.
    pub settings: ChatSettings,
    /// Media bound to the word, `None` when the user has no mapping.
    pub file_id: Option<String>,
}

/// A stored word binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    /// Keyword.
    pub word: String,
    /// Media bound to the keyword.
    pub file_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_prefers_username() {
        let mut sender = Sender {
            id: 1,
            username: Some("kitty".to_string()),
            display_name: "Kitty Cat".to_string(),
            is_bot: false,
        };
        assert_eq!(sender.mention(), "@kitty");

        sender.username = Some(String::new());
        assert_eq!(sender.mention(), "Kitty Cat");

        sender.username = None;
        assert_eq!(sender.mention(), "Kitty Cat");
    }

    #[test]
    fn default_settings_match_fresh_chat() {
        let settings = ChatSettings::default();
        assert!(settings.enabled);
        assert!(settings.auto_delete);
        assert_eq!(settings.limit, 5);
        assert_eq!(settings.window_seconds, 5);
    }
}
