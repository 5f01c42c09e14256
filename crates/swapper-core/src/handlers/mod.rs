//! Handlers that turn classified inbound events into deliverables.
//!
//! Every handler runs to completion on the receive task of the account that
//! got the event; outbound items go through the account's [`Outbox`].

mod admin;
mod commands;
mod inline;
mod swap;
pub mod views;

use crate::classifier::{classify, Route};
use crate::model::InboundEvent;
use crate::state::SharedState;
use crate::storage::SwapStore;
use crate::transport::{ChatTransport, Outbox};
use std::sync::Arc;
use tracing::trace;

/// Routes inbound events to the handler for their [`Route`].
///
/// Cheap to clone; every account pipeline holds one over the same store and
/// shared state.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn SwapStore>,
    state: Arc<SharedState>,
}

impl Dispatcher {
    /// Create a dispatcher over `store` and `state`.
    #[must_use]
    pub fn new(store: Arc<dyn SwapStore>, state: Arc<SharedState>) -> Self {
        Self { store, state }
    }

    /// Shared limiter, interaction and settings state.
    #[must_use]
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Handle one inbound event.
    ///
    /// `transport` is used for the synchronous side calls (message deletion,
    /// admin checks); replies are queued on `outbox`.
    pub async fn dispatch(
        &self,
        transport: &dyn ChatTransport,
        event: InboundEvent,
        outbox: &Outbox,
    ) {
        match classify(&event) {
            Route::InlineQuery => inline::answer(self, &event, outbox).await,
            Route::Command if event.chat.private => {
                commands::handle_text(self, &event, outbox).await;
            }
            Route::Command => admin::handle(self, transport, &event, outbox).await,
            Route::MediaUpload => commands::handle_media(self, &event, outbox).await,
            Route::SwapCandidate => swap::substitute(self, transport, &event, outbox).await,
            Route::Ignorable => {
                trace!(
                    chat_id = event.chat.id,
                    message_id = event.message_id,
                    "Ignoring event"
                );
            }
        }
    }
}
