//! Group keyword substitution.

use super::{views, Dispatcher};
use crate::model::{Deliverable, InboundEvent};
use crate::transport::{ChatTransport, Outbox};
use tracing::{debug, error, trace, warn};

/// Replace a keyword message with the sender's sticker.
///
/// Rate-limit denial and unknown words are silent. Lookup failures are only
/// logged; a group should not see an error for every unmatched message.
pub(super) async fn substitute(
    dispatcher: &Dispatcher,
    transport: &dyn ChatTransport,
    event: &InboundEvent,
    outbox: &Outbox,
) {
    let chat_id = event.chat.id;
    let user_id = event.sender.id;
    let word = event.text().trim();

    let lookup = match dispatcher.store.lookup_swap(user_id, chat_id, word).await {
        Ok(lookup) => lookup,
        Err(e) => {
            error!(chat_id, user_id, error = %e, "Swap lookup failed");
            return;
        }
    };

    let settings = lookup.settings;
    let limiter = &dispatcher.state.limiter;
    limiter.refresh(chat_id, settings.limit, settings.window_seconds);

    let Some(file_id) = lookup.file_id.filter(|_| settings.enabled) else {
        return;
    };
    if !limiter.admit(chat_id, settings.limit, settings.window_seconds) {
        trace!(chat_id, user_id, "Swap denied by rate limit");
        return;
    }

    debug!(chat_id, user_id, word, "Swapping message");
    outbox
        .push(Deliverable::MediaShare {
            chat_id,
            file_id,
            reply_to: event.reply_to,
        })
        .await;

    if settings.auto_delete {
        if let Err(e) = transport.delete_message(chat_id, event.message_id).await {
            warn!(
                chat_id,
                message_id = event.message_id,
                error = %e,
                "Could not delete swapped message"
            );
        }
    }

    outbox
        .push(Deliverable::text(
            chat_id,
            views::swapped_from(&event.sender.mention()),
        ))
        .await;
}
