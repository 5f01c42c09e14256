//! Telegram implementation of [`ChatTransport`].
//!
//! Inbound events come from a long-polling task; outbound deliverables map
//! onto single Bot API calls, retried with backoff.

use crate::convert::inbound_event;
use crate::retry::retry_telegram_operation;
use async_trait::async_trait;
use std::time::Duration;
use swapper_core::model::{Deliverable, InboundEvent, InlineResult, SwitchPrivateHint};
use swapper_core::transport::OUTBOUND_CAPACITY;
use swapper_core::{ChatTransport, TransportError};
use teloxide::prelude::*;
use teloxide::types::{
    AllowedUpdate, FileId, InlineQueryId, InlineQueryResult, InlineQueryResultCachedSticker,
    InlineQueryResultsButton, InlineQueryResultsButtonKind, InputFile, MessageId, ReplyParameters,
    UserId,
};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Seconds the Bot API holds a `getUpdates` call open.
pub const POLL_TIMEOUT_SECS: u32 = 30;
/// Pause after a failed poll.
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);
/// Seconds an inline answer may be cached by Telegram.
pub const INLINE_CACHE_SECS: u32 = 30;

/// One bot account on the Telegram Bot API.
pub struct TelegramTransport {
    bot: Bot,
    account: usize,
    username: String,
    cancel: CancellationToken,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl TelegramTransport {
    /// Log in with `token` and verify it against the Bot API.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the HTTP client cannot be built
    /// or the token is rejected.
    pub async fn login(account: usize, token: &str) -> Result<Self, TransportError> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(u64::from(POLL_TIMEOUT_SECS) + 15))
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let bot = Bot::with_client(token, client);

        let me = retry_telegram_operation(|| async {
            bot.get_me()
                .await
                .map_err(|e| anyhow::anyhow!("Telegram getMe error: {e}"))
        })
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))?;

        let username = me.username().to_string();
        info!(account, username = %username, "Logged in to Telegram");
        Ok(Self {
            bot,
            account,
            username,
            cancel: CancellationToken::new(),
            poller: Mutex::new(None),
        })
    }

    /// Bot username, without the leading `@`.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    async fn send_text(
        &self,
        chat_id: i64,
        text: String,
        reply_to: Option<i32>,
    ) -> anyhow::Result<()> {
        retry_telegram_operation(|| async {
            let mut request = self.bot.send_message(ChatId(chat_id), text.clone());
            if let Some(id) = reply_to {
                request = request.reply_parameters(ReplyParameters::new(MessageId(id)));
            }
            request
                .await
                .map(|_| ())
                .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
        })
        .await
    }

    async fn send_sticker(
        &self,
        chat_id: i64,
        file_id: String,
        reply_to: Option<i32>,
    ) -> anyhow::Result<()> {
        retry_telegram_operation(|| async {
            let mut request = self
                .bot
                .send_sticker(ChatId(chat_id), InputFile::file_id(FileId(file_id.clone())));
            if let Some(id) = reply_to {
                request = request.reply_parameters(ReplyParameters::new(MessageId(id)));
            }
            request
                .await
                .map(|_| ())
                .map_err(|e| anyhow::anyhow!("Telegram sticker error: {e}"))
        })
        .await
    }

    async fn answer_inline(
        &self,
        query_id: String,
        results: Vec<InlineResult>,
        switch_private: Option<SwitchPrivateHint>,
    ) -> anyhow::Result<()> {
        let results: Vec<InlineQueryResult> = results
            .into_iter()
            .map(|result| {
                InlineQueryResult::CachedSticker(InlineQueryResultCachedSticker::new(
                    result.id,
                    FileId(result.file_id),
                ))
            })
            .collect();
        let button = switch_private.map(|hint| InlineQueryResultsButton {
            text: hint.text,
            kind: InlineQueryResultsButtonKind::StartParameter(hint.start_parameter),
        });

        // Inline query ids expire quickly; a retry would only hit a dead id.
        let mut request = self
            .bot
            .answer_inline_query(InlineQueryId(query_id), results)
            .cache_time(INLINE_CACHE_SECS)
            .is_personal(true);
        if let Some(button) = button {
            request = request.button(button);
        }
        request
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("Telegram inline answer error: {e}"))
    }
}

async fn poll_updates(
    bot: Bot,
    account: usize,
    events: mpsc::Sender<InboundEvent>,
    cancel: CancellationToken,
) {
    let mut offset: i32 = 0;
    loop {
        let request = bot
            .get_updates()
            .offset(offset)
            .timeout(POLL_TIMEOUT_SECS)
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::InlineQuery]);
        let polled = tokio::select! {
            () = cancel.cancelled() => break,
            polled = request.send() => polled,
        };

        let updates = match polled {
            Ok(updates) => updates,
            Err(e) => {
                warn!(account, error = %e, "Polling for updates failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(POLL_ERROR_PAUSE) => continue,
                }
            }
        };

        for update in updates {
            offset = i32::try_from(update.id.0).map_or(offset, |id| id.saturating_add(1));
            let Some(event) = inbound_event(&update) else {
                debug!(
                    account,
                    update_id = update.id.0,
                    "Skipping unsupported update"
                );
                continue;
            };
            if events.send(event).await.is_err() {
                debug!(account, "Inbound receiver dropped; stopping poller");
                return;
            }
        }
    }
    debug!(account, "Poller cancelled");
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn connect(&self) -> Result<mpsc::Receiver<InboundEvent>, TransportError> {
        let mut poller = self.poller.lock().await;
        if poller.is_some() {
            return Err(TransportError::Connect("already connected".to_string()));
        }
        if self.cancel.is_cancelled() {
            return Err(TransportError::Stopped);
        }

        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        *poller = Some(tokio::spawn(poll_updates(
            self.bot.clone(),
            self.account,
            tx,
            self.cancel.clone(),
        )));
        info!(account = self.account, username = %self.username, "Polling for updates");
        Ok(rx)
    }

    async fn send(&self, deliverable: Deliverable) -> Result<(), TransportError> {
        let result = match deliverable {
            Deliverable::Text {
                chat_id,
                text,
                reply_to,
            } => self.send_text(chat_id, text, reply_to).await,
            Deliverable::MediaShare {
                chat_id,
                file_id,
                reply_to,
            } => self.send_sticker(chat_id, file_id, reply_to).await,
            Deliverable::InlineAnswer {
                query_id,
                results,
                switch_private,
            } => self.answer_inline(query_id, results, switch_private).await,
        };
        result.map_err(|e| TransportError::Request(e.to_string()))
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .map(|_| ())
            .map_err(|e| TransportError::Request(e.to_string()))
    }

    async fn is_chat_admin(&self, chat_id: i64, user_id: i64) -> Result<bool, TransportError> {
        let member = self
            .bot
            .get_chat_member(ChatId(chat_id), UserId(user_id.cast_unsigned()))
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(member.is_privileged())
    }

    async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.poller.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(account = self.account, error = %e, "Poller task failed");
            }
        }
        info!(account = self.account, "Telegram transport stopped");
    }
}
