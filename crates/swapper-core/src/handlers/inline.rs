//! Inline search over the requesting user's mappings.

use super::{views, Dispatcher};
use crate::classifier::MAX_WORD_LEN;
use crate::model::{Deliverable, InboundEvent, InlineResult, SwitchPrivateHint};
use crate::transport::Outbox;
use tracing::error;

/// Most results returned for one query.
pub const INLINE_RESULT_CAP: usize = 50;
/// Term that lists every mapping.
pub const INLINE_WILDCARD: &str = "*";

/// Search prefix for `query`: empty for the wildcard, `None` when invalid.
fn search_prefix(query: &str) -> Option<&str> {
    let term = query.trim();
    if term == INLINE_WILDCARD {
        return Some("");
    }
    if term.is_empty() || term.len() > MAX_WORD_LEN {
        return None;
    }
    Some(term)
}

fn switch_hint() -> SwitchPrivateHint {
    SwitchPrivateHint {
        text: views::INLINE_SWITCH_TEXT.to_string(),
        start_parameter: views::INLINE_SWITCH_PARAMETER.to_string(),
    }
}

/// Answer an inline query. Every query gets an answer, possibly empty.
pub(super) async fn answer(dispatcher: &Dispatcher, event: &InboundEvent, outbox: &Outbox) {
    let Some(query) = event.inline_query.as_ref() else {
        return;
    };
    let user_id = event.sender.id;

    let results = match search_prefix(&query.query) {
        Some(prefix) => match dispatcher
            .store
            .search_mappings(user_id, prefix, INLINE_RESULT_CAP)
            .await
        {
            Ok(mappings) => mappings
                .into_iter()
                .enumerate()
                .map(|(index, mapping)| InlineResult {
                    id: index.to_string(),
                    title: mapping.word,
                    file_id: mapping.file_id,
                })
                .collect(),
            Err(e) => {
                error!(user_id, error = %e, "Inline search failed");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let switch_private = results.is_empty().then(switch_hint);
    outbox
        .push(Deliverable::InlineAnswer {
            query_id: query.id.clone(),
            results,
            switch_private,
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_accepts_wildcard_and_bounded_terms() {
        assert_eq!(search_prefix("*"), Some(""));
        assert_eq!(search_prefix("  cat "), Some("cat"));
        assert_eq!(search_prefix("c"), Some("c"));
        assert_eq!(search_prefix(&"x".repeat(16)), Some("x".repeat(16).as_str()));
    }

    #[test]
    fn prefix_rejects_empty_and_long_terms() {
        assert_eq!(search_prefix(""), None);
        assert_eq!(search_prefix("   "), None);
        assert_eq!(search_prefix(&"x".repeat(17)), None);
    }
}
