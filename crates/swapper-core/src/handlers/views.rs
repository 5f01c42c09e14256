//! Reply texts shown to chat users.

// ─────────────────────────────────────────────────────────────────────────────
// Private chat
// ─────────────────────────────────────────────────────────────────────────────

/// Reply to input the bot does not understand.
pub const HELP: &str = "I'm sorry, I don't recognize that command.
You can use the following commands:

/add <word> - Add a word to be swapped
/get <word> - Get the sticker assigned to the word
/remove <word> - Remove a swapped word
/remove - Send a sticker to remove every word bound to it

/list - List all your swapped words
/clear - Remove all your swapped words
/help - More information about me!";

/// Greeting for `/start`.
pub const GREETING: &str = "Hello there, I'm the sticker swapper!

Register a word with /add <word> and send me a sticker. In groups I share
that sticker whenever you post the word, and you can search your words
inline by typing my name followed by the word in any chat.

Use /help to see everything I can do.";

/// Reply to `/help`.
pub const HELP_EXTENDED: &str = "I swap the words you send with your stickers!

Use \"/add <word>\" to pick a word, then send me the sticker to swap it with.
In any group we share, I replace your swap words with your stickers.

Inline mode works in every chat, even ones I'm not in: type my name and a word.

Group admins can tune me per group; send /swap_help in the group for details.

/add <word> - Add a word to be swapped
/get <word> - Get the sticker assigned to the word
/remove <word> - Remove a swapped word
/remove - Send a sticker to remove every word bound to it
/list - List all your swapped words
/clear - Remove all your swapped words";

/// Generic failure reply; details only go to the logs.
pub const ERROR: &str = "Sorry, I seem to have encountered an error.

Please try again later.";

/// Word outside the accepted length range.
pub const WORD_LENGTH: &str =
    "Sorry, but swapped words must be at least 3 characters and limited to a max of 16 characters!";

/// Sticker sent without a pending `/add` or `/remove`.
pub const STICKER_UNEXPECTED: &str =
    "Nice sticker! Use \"/add <word>\" first to tell me which word it should swap.";

/// Pending `/add` or `/remove` answered with something other than a sticker.
pub const STICKER_REQUIRED: &str =
    "Sorry, but I require a Sticker.\n\nPlease invoke the command to try again.";

/// Prompt after `/clear`.
pub const CLEAR_PROMPT: &str = "Please reply with \"confirm\" in order to clear your list.";

/// Reply after the list was cleared.
pub const CLEARED: &str = "Sweet! I've cleared your swap list!";

/// Prompt after `/remove` without a word.
pub const REMOVE_PROMPT: &str = "OK! Send me the sticker you want to stop swapping.";

/// Reply to `/list` with no mappings.
pub const NO_WORDS: &str = "You currently have no swapped words set.";

/// Prompt after `/add <word>`.
#[must_use]
pub fn add_prompt(word: &str) -> String {
    format!("OK! Send me a sticker to swap for \"{word}\"")
}

/// Reply after a sticker was bound.
#[must_use]
pub fn added(word: &str) -> String {
    format!("Sweet! I added the sticker to the swap word \"{word}\"!")
}

/// Reply after `/remove <word>`.
#[must_use]
pub fn removed(word: &str) -> String {
    format!("Sweet! I've removed the swap word \"{word}\"!")
}

/// Reply after a sticker was unbound from `words`.
#[must_use]
pub fn removed_by_sticker(words: &[String]) -> String {
    if words.is_empty() {
        return "That sticker isn't bound to any of your words.".to_string();
    }
    let mut out = String::from("Sweet! I've removed the swap words:\n");
    for word in words {
        out.push_str("- ");
        out.push_str(word);
        out.push('\n');
    }
    out
}

/// Reply to `/get <word>` without a mapping.
#[must_use]
pub fn not_mapped(word: &str) -> String {
    format!("You don't have a sticker mapped for \"{word}\"!")
}

/// Reply to `/list`.
#[must_use]
pub fn word_list(words: &[String]) -> String {
    if words.is_empty() {
        return NO_WORDS.to_string();
    }
    let mut out = String::from("You are currently swapping the words:\n");
    for word in words {
        out.push_str("- ");
        out.push_str(word);
        out.push('\n');
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Group chat
// ─────────────────────────────────────────────────────────────────────────────

/// Attribution posted after a swapped sticker.
#[must_use]
pub fn swapped_from(mention: &str) -> String {
    format!("Swapped message from {mention}")
}

/// Reply to `/swap_help`.
pub const ADMIN_HELP: &str = "As a group admin, you can set some limits on me!

/swap_help - Show this help message.
/swap_options - Show the settings of this group.
/swap_limit <0 - 65535> - Swaps allowed per timeout period, zero disables the limit.
/swap_timeout <0 - 65535> - Length of the limit period in seconds.
/swap_delete <true|false|1|0|yes|no> - Try to delete swapped messages.
/swap_enable <true|false|1|0|yes|no> - Master switch for swapping in this group.";

/// Generic failure reply for the admin commands.
pub const ADMIN_ERROR: &str = "Sorry, I seem to have encountered an error when changing that setting.

Please try again later.";

/// Reply to `/swap_options`.
#[must_use]
pub fn settings_summary(settings: &crate::model::ChatSettings) -> String {
    format!(
        "I have the following settings:\n\nSwapping Enabled: {}\nRemove Swapped: {}\nSwap Limit: {}\nSwap Timeout: {} seconds.",
        settings.enabled, settings.auto_delete, settings.limit, settings.window_seconds
    )
}

/// Usage reply for an unparsable option value.
#[must_use]
pub fn admin_usage(command: &str, argument: &str) -> String {
    format!(
        "Sorry, I don't recognize that option value.\n\nThe correct usage should be \"/{command} {argument}\""
    )
}

/// Confirmation of a numeric setting change.
#[must_use]
pub fn admin_updated_number(command: &str, value: u16, unit: &str) -> String {
    format!("Sweet! I've updated the \"{command}\" setting to {value} {unit}!")
}

/// Confirmation of a switch setting change.
#[must_use]
pub fn admin_updated_switch(command: &str, value: bool) -> String {
    format!("Sweet! I've updated the \"{command}\" setting to \"{value}\"!")
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline mode
// ─────────────────────────────────────────────────────────────────────────────

/// Label of the button shown above an empty inline answer.
pub const INLINE_SWITCH_TEXT: &str = "Click here to add some Stickers!";
/// `/start` payload sent by that button.
pub const INLINE_SWITCH_PARAMETER: &str = "new";
