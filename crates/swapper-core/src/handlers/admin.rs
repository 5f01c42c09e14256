//! Group admin commands that tune per-chat settings.

use super::{views, Dispatcher};
use crate::classifier::command_token;
use crate::model::{Deliverable, InboundEvent};
use crate::storage::StorageError;
use crate::transport::{ChatTransport, Outbox};
use tracing::{debug, error, info};

const NUMBER_ARGUMENT: &str = "<0 - 65535>";
const SWITCH_ARGUMENT: &str = "<true|false|1|0|yes|no>";

/// A settings write requested by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingChange {
    Limit(u16),
    Timeout(u16),
    AutoDelete(bool),
    Enabled(bool),
}

impl SettingChange {
    const fn command(self) -> &'static str {
        match self {
            Self::Limit(_) => "swap_limit",
            Self::Timeout(_) => "swap_timeout",
            Self::AutoDelete(_) => "swap_delete",
            Self::Enabled(_) => "swap_enable",
        }
    }

    /// Whether the change alters the admission window.
    const fn resets_window(self) -> bool {
        matches!(self, Self::Limit(_) | Self::Timeout(_))
    }

    fn confirmation(self) -> String {
        match self {
            Self::Limit(value) => views::admin_updated_number(self.command(), value, "swaps"),
            Self::Timeout(value) => views::admin_updated_number(self.command(), value, "seconds"),
            Self::AutoDelete(value) | Self::Enabled(value) => {
                views::admin_updated_switch(self.command(), value)
            }
        }
    }
}

/// Parsed admin command.
#[derive(Debug, PartialEq, Eq)]
enum AdminCommand {
    Help,
    Options,
    Change(SettingChange),
    /// Recognized command with an unparsable value; carries the usage reply.
    Invalid(String),
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" => Some(true),
        "0" | "false" | "f" | "no" => Some(false),
        _ => None,
    }
}

impl AdminCommand {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let name = command_token(text)?.to_ascii_lowercase();
        let argument = text
            .split_once(char::is_whitespace)
            .map_or("", |(_, rest)| rest.trim());

        let number = |command: &str, build: fn(u16) -> SettingChange| {
            argument.parse::<u16>().map_or_else(
                |_| Self::Invalid(views::admin_usage(command, NUMBER_ARGUMENT)),
                |value| Self::Change(build(value)),
            )
        };
        let switch = |command: &str, build: fn(bool) -> SettingChange| {
            parse_switch(argument).map_or_else(
                || Self::Invalid(views::admin_usage(command, SWITCH_ARGUMENT)),
                |value| Self::Change(build(value)),
            )
        };

        let command = match name.as_slice() {
            b"swap_help" => Self::Help,
            b"swap_options" => Self::Options,
            b"swap_limit" => number("swap_limit", SettingChange::Limit),
            b"swap_timeout" => number("swap_timeout", SettingChange::Timeout),
            b"swap_delete" => switch("swap_delete", SettingChange::AutoDelete),
            b"swap_enable" => switch("swap_enable", SettingChange::Enabled),
            _ => return None,
        };
        Some(command)
    }
}

/// Handle an admin command in a group chat. Non-admins are ignored.
pub(super) async fn handle(
    dispatcher: &Dispatcher,
    transport: &dyn ChatTransport,
    event: &InboundEvent,
    outbox: &Outbox,
) {
    let chat_id = event.chat.id;
    let user_id = event.sender.id;

    match transport.is_chat_admin(chat_id, user_id).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(chat_id, user = %event.sender.mention(), "Non-admin attempted an admin command");
            return;
        }
        Err(e) => {
            error!(chat_id, user_id, error = %e, "Chat member lookup failed");
            return;
        }
    }

    let Some(command) = AdminCommand::parse(event.text()) else {
        return;
    };
    let reply = match command {
        AdminCommand::Help => views::ADMIN_HELP.to_string(),
        AdminCommand::Invalid(usage) => usage,
        AdminCommand::Options => {
            match dispatcher
                .state
                .settings
                .get(dispatcher.store.as_ref(), chat_id)
                .await
            {
                Ok(settings) => views::settings_summary(&settings),
                Err(e) => {
                    error!(chat_id, error = %e, "Could not load chat settings");
                    views::ADMIN_ERROR.to_string()
                }
            }
        }
        AdminCommand::Change(change) => match apply(dispatcher, chat_id, change).await {
            Ok(()) => {
                info!(chat_id, user_id, ?change, "Admin updated chat setting");
                change.confirmation()
            }
            Err(e) => {
                error!(
                    chat_id,
                    command = change.command(),
                    error = %e,
                    "Could not update chat setting"
                );
                views::ADMIN_ERROR.to_string()
            }
        },
    };
    outbox
        .push(Deliverable::reply(chat_id, event.message_id, reply))
        .await;
}

/// Persist `change`, then drop the cached copies it invalidates.
async fn apply(
    dispatcher: &Dispatcher,
    chat_id: i64,
    change: SettingChange,
) -> Result<(), StorageError> {
    let store = &dispatcher.store;
    match change {
        SettingChange::Limit(value) => store.set_limit(chat_id, value).await?,
        SettingChange::Timeout(value) => store.set_timeout(chat_id, value).await?,
        SettingChange::AutoDelete(value) => store.set_auto_delete(chat_id, value).await?,
        SettingChange::Enabled(value) => store.set_enabled(chat_id, value).await?,
    }
    dispatcher.state.settings.evict(chat_id).await;
    if change.resets_window() {
        dispatcher.state.limiter.reset(chat_id);
    }
    Ok(())
}
