//! Conversion from Telegram updates to inbound events.

use swapper_core::model::{Chat, InboundEvent, InlineQuery, Media, Sender};
use teloxide::types::{Message, Update, UpdateKind, User};

fn sender(user: &User) -> Sender {
    Sender {
        id: user.id.0.cast_signed(),
        username: user.username.clone(),
        display_name: user.full_name(),
        is_bot: user.is_bot,
    }
}

fn from_message(msg: &Message) -> Option<InboundEvent> {
    let from = msg.from.as_ref()?;
    let media = msg.sticker().map(|sticker| Media {
        file_id: sticker.file.id.0.clone(),
        unique_id: sticker.file.unique_id.0.clone(),
    });
    Some(InboundEvent {
        message_id: msg.id.0,
        chat: Chat {
            id: msg.chat.id.0,
            private: msg.chat.is_private(),
        },
        sender: sender(from),
        text: msg.text().map(str::to_string),
        media,
        inline_query: None,
        reply_to: msg.reply_to_message().map(|reply| reply.id.0),
    })
}

/// Inbound event for `update`, `None` for update kinds the bot does not handle.
#[must_use]
pub fn inbound_event(update: &Update) -> Option<InboundEvent> {
    match &update.kind {
        UpdateKind::Message(msg) => from_message(msg),
        UpdateKind::InlineQuery(query) => {
            let from = sender(&query.from);
            Some(InboundEvent {
                message_id: 0,
                chat: Chat {
                    id: from.id,
                    private: true,
                },
                sender: from,
                text: None,
                media: None,
                inline_query: Some(InlineQuery {
                    id: query.id.to_string(),
                    query: query.query.clone(),
                }),
                reply_to: None,
            })
        }
        _ => None,
    }
}
