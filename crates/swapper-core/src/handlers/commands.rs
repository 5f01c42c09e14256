//! Private chat commands and the per-user interaction flow.

use super::{views, Dispatcher};
use crate::classifier::{ascii_fold_eq, COMMAND_PREFIX, MAX_WORD_LEN, MIN_WORD_LEN};
use crate::interaction::UserState;
use crate::model::{Deliverable, InboundEvent, Media};
use crate::storage::StorageError;
use crate::transport::Outbox;
use tracing::{debug, error, info};

/// Reply that confirms `/clear`.
const CONFIRM: &[u8] = b"confirm";

/// Private command parsed from message text.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Start,
    Help,
    List,
    Clear,
    Add(&'a str),
    Get(&'a str),
    Remove(Option<&'a str>),
    Unknown,
}

impl<'a> Command<'a> {
    /// Parse `/name[@bot] [argument]`; `None` for text that is not a command.
    fn parse(text: &'a str) -> Option<Self> {
        let body = text.trim().strip_prefix(char::from(COMMAND_PREFIX))?;
        let (name, argument) = body
            .split_once(char::is_whitespace)
            .map_or((body, ""), |(name, rest)| (name, rest.trim()));
        let name = name.split('@').next().unwrap_or_default();

        let command = match name.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "list" => Self::List,
            "clear" => Self::Clear,
            "add" => Self::Add(argument),
            "get" => Self::Get(argument),
            "remove" if argument.is_empty() => Self::Remove(None),
            "remove" => Self::Remove(Some(argument)),
            _ => Self::Unknown,
        };
        Some(command)
    }
}

/// Validate a word argument, replying with the reason when it is rejected.
async fn checked_word<'a>(word: &'a str, chat_id: i64, outbox: &Outbox) -> Option<&'a str> {
    if word.is_empty() {
        outbox.push(Deliverable::text(chat_id, views::HELP)).await;
        return None;
    }
    if !(MIN_WORD_LEN..=MAX_WORD_LEN).contains(&word.len()) {
        outbox.push(Deliverable::text(chat_id, views::WORD_LENGTH)).await;
        return None;
    }
    Some(word)
}

/// Reply text for a finished store call.
fn outcome<T>(
    result: Result<T, StorageError>,
    user_id: i64,
    action: &str,
    ok: impl FnOnce(T) -> String,
) -> String {
    match result {
        Ok(value) => ok(value),
        Err(e) => {
            error!(user_id, action, error = %e, "Private command failed");
            views::ERROR.to_string()
        }
    }
}

/// Handle text (or an unsupported attachment) sent in a private chat.
pub(super) async fn handle_text(dispatcher: &Dispatcher, event: &InboundEvent, outbox: &Outbox) {
    let user_id = event.sender.id;
    let chat_id = event.chat.id;
    let interactions = &dispatcher.state.interactions;
    let pending = interactions.take(user_id);

    match pending {
        UserState::AwaitingClearConfirmation
            if event.text().trim().len() == CONFIRM.len()
                && ascii_fold_eq(event.text().trim().as_bytes(), CONFIRM) =>
        {
            let result = dispatcher.store.delete_all_for_user(user_id).await;
            let reply = outcome(result, user_id, "clear", |removed| {
                info!(user_id, removed, "Cleared swap list");
                views::CLEARED.to_string()
            });
            outbox.push(Deliverable::text(chat_id, reply)).await;
            return;
        }
        UserState::AwaitingMediaForWord(_) | UserState::AwaitingMediaForRemoval
            if event.text.is_none() =>
        {
            outbox
                .push(Deliverable::text(chat_id, views::STICKER_REQUIRED))
                .await;
            return;
        }
        UserState::Idle => {}
        abandoned => debug!(user_id, state = ?abandoned, "Discarding pending action"),
    }

    let Some(command) = Command::parse(event.text()) else {
        outbox.push(Deliverable::text(chat_id, views::HELP)).await;
        return;
    };

    let reply = match command {
        Command::Start => views::GREETING.to_string(),
        Command::Help => views::HELP_EXTENDED.to_string(),
        Command::Unknown => views::HELP.to_string(),
        Command::List => {
            let result = dispatcher.store.list_words(user_id).await;
            outcome(result, user_id, "list", |words| views::word_list(&words))
        }
        Command::Clear => {
            interactions.set(user_id, UserState::AwaitingClearConfirmation);
            views::CLEAR_PROMPT.to_string()
        }
        Command::Remove(None) => {
            interactions.set(user_id, UserState::AwaitingMediaForRemoval);
            views::REMOVE_PROMPT.to_string()
        }
        Command::Add(word) => {
            let Some(word) = checked_word(word, chat_id, outbox).await else {
                return;
            };
            interactions.set(user_id, UserState::AwaitingMediaForWord(word.to_string()));
            views::add_prompt(word)
        }
        Command::Remove(Some(word)) => {
            let Some(word) = checked_word(word, chat_id, outbox).await else {
                return;
            };
            let result = dispatcher.store.delete_mapping(user_id, word).await;
            outcome(result, user_id, "remove", |_| views::removed(word))
        }
        Command::Get(word) => {
            let Some(word) = checked_word(word, chat_id, outbox).await else {
                return;
            };
            match dispatcher.store.get_mapping(user_id, word).await {
                Ok(Some(file_id)) => {
                    outbox
                        .push(Deliverable::MediaShare {
                            chat_id,
                            file_id,
                            reply_to: None,
                        })
                        .await;
                    return;
                }
                Ok(None) => views::not_mapped(word),
                Err(e) => {
                    error!(user_id, action = "get", error = %e, "Private command failed");
                    views::ERROR.to_string()
                }
            }
        }
    };
    outbox.push(Deliverable::text(chat_id, reply)).await;
}

/// Handle a sticker sent in a private chat.
pub(super) async fn handle_media(dispatcher: &Dispatcher, event: &InboundEvent, outbox: &Outbox) {
    let Some(media) = event.media.as_ref() else {
        return;
    };
    let user_id = event.sender.id;
    let chat_id = event.chat.id;

    let reply = match dispatcher.state.interactions.take(user_id) {
        UserState::AwaitingMediaForWord(word) => bind(dispatcher, user_id, &word, media).await,
        UserState::AwaitingMediaForRemoval => unbind(dispatcher, user_id, media).await,
        UserState::AwaitingClearConfirmation | UserState::Idle => {
            views::STICKER_UNEXPECTED.to_string()
        }
    };
    outbox.push(Deliverable::text(chat_id, reply)).await;
}

async fn bind(dispatcher: &Dispatcher, user_id: i64, word: &str, media: &Media) -> String {
    let result = dispatcher.store.upsert_mapping(user_id, word, media).await;
    outcome(result, user_id, "add", |()| {
        info!(user_id, word, "Bound swap word");
        views::added(word)
    })
}

async fn unbind(dispatcher: &Dispatcher, user_id: i64, media: &Media) -> String {
    let words = match dispatcher
        .store
        .list_by_media(user_id, &media.unique_id)
        .await
    {
        Ok(words) => words,
        Err(e) => {
            error!(user_id, action = "remove", error = %e, "Private command failed");
            return views::ERROR.to_string();
        }
    };
    let result = dispatcher
        .store
        .delete_by_media(user_id, &media.unique_id)
        .await;
    outcome(result, user_id, "remove", |removed| {
        info!(user_id, removed, "Unbound sticker");
        views::removed_by_sticker(&words)
    })
}
