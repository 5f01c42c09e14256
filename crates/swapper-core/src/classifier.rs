//! Maps a raw inbound event to the route that handles it.
//!
//! Classification is pure: no state is read or written here.

use crate::model::InboundEvent;

/// Prefix that starts every bot command.
pub const COMMAND_PREFIX: u8 = b'/';
/// Shortest keyword that can be swapped, in bytes.
pub const MIN_WORD_LEN: usize = 3;
/// Longest keyword that can be swapped, in bytes.
pub const MAX_WORD_LEN: usize = 16;

/// Group commands reserved for chat administrators.
pub const ADMIN_COMMANDS: &[&str] = &[
    "swap_help",
    "swap_options",
    "swap_limit",
    "swap_timeout",
    "swap_delete",
    "swap_enable",
];

/// Handler family an inbound event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Inline search.
    InlineQuery,
    /// Private chat input or a group admin command.
    Command,
    /// Group text that may be a swap keyword.
    SwapCandidate,
    /// Media sent in a private chat.
    MediaUpload,
    /// Nothing to do.
    Ignorable,
}

/// Classify an inbound event.
#[must_use]
pub fn classify(event: &InboundEvent) -> Route {
    if event.inline_query.is_some() {
        return Route::InlineQuery;
    }
    if event.sender.is_bot {
        return Route::Ignorable;
    }
    if event.chat.private {
        if event.media.is_some() {
            return Route::MediaUpload;
        }
        return Route::Command;
    }

    let text = event.text();
    if is_admin_command(text) {
        return Route::Command;
    }
    if is_swap_candidate(text) {
        return Route::SwapCandidate;
    }
    Route::Ignorable
}

/// Whether `text` starts with a recognized admin command token.
#[must_use]
pub fn is_admin_command(text: &str) -> bool {
    let Some(token) = command_token(text) else {
        return false;
    };
    ADMIN_COMMANDS
        .iter()
        .any(|name| token.len() == name.len() && ascii_fold_eq(token, name.as_bytes()))
}

/// Whether `text` is a plain keyword eligible for substitution.
#[must_use]
pub fn is_swap_candidate(text: &str) -> bool {
    let bytes = text.as_bytes();
    match bytes.first() {
        Some(&first) => {
            (MIN_WORD_LEN..=MAX_WORD_LEN).contains(&bytes.len())
                && first != COMMAND_PREFIX
                && first > b' '
                && first != 0x7f
        }
        None => false,
    }
}

/// Bytes of the command name: after the prefix, up to a space or `@bot` suffix.
#[must_use]
pub fn command_token(text: &str) -> Option<&[u8]> {
    let rest = text.as_bytes().strip_prefix(&[COMMAND_PREFIX])?;
    let end = rest
        .iter()
        .position(|b| *b == b' ' || *b == b'@' || *b == b'\n')
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// ASCII-only case-insensitive comparison of `input` against a lowercase
/// `expected` prefix, folding each byte by exactly 32. Locale independent.
#[must_use]
pub fn ascii_fold_eq(input: &[u8], expected: &[u8]) -> bool {
    if input.len() < expected.len() {
        return false;
    }
    input.iter().zip(expected).all(|(a, b)| {
        a == b || (b.is_ascii_lowercase() && a.wrapping_add(32) == *b)
            || (a.is_ascii_lowercase() && b.wrapping_add(32) == *a)
    })
}
