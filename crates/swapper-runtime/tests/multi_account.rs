//! Several accounts over one store and one shared state.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swapper_core::handlers::views;
use swapper_core::model::{Chat, Deliverable, InboundEvent, Media, Sender};
use swapper_core::{ChatTransport, SqliteStore, SwapStore, TransportError};
use swapper_runtime::pipeline::SHUTDOWN_GRACE;
use swapper_runtime::Swapper;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio_util::sync::CancellationToken;

struct Account {
    inbound: Mutex<Option<mpsc::Receiver<InboundEvent>>>,
    delivered: mpsc::UnboundedSender<Deliverable>,
    stuck: AtomicBool,
    sending: Notify,
    stopped: AtomicBool,
}

#[async_trait]
impl ChatTransport for Account {
    async fn connect(&self) -> Result<mpsc::Receiver<InboundEvent>, TransportError> {
        self.inbound
            .lock()
            .await
            .take()
            .ok_or_else(|| TransportError::Connect("already connected".to_string()))
    }

    async fn send(&self, deliverable: Deliverable) -> Result<(), TransportError> {
        if self.stuck.load(Ordering::SeqCst) {
            self.sending.notify_one();
            std::future::pending::<()>().await;
        }
        self.delivered
            .send(deliverable)
            .map_err(|_| TransportError::Stopped)
    }

    async fn delete_message(&self, _chat_id: i64, _message_id: i32) -> Result<(), TransportError> {
        Ok(())
    }

    async fn is_chat_admin(&self, _chat_id: i64, _user_id: i64) -> Result<bool, TransportError> {
        Ok(false)
    }

    async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

struct Handle {
    account: Arc<Account>,
    events: mpsc::Sender<InboundEvent>,
    delivered: mpsc::UnboundedReceiver<Deliverable>,
}

fn account() -> Handle {
    let (events, inbound) = mpsc::channel(16);
    let (delivered_tx, delivered) = mpsc::unbounded_channel();
    Handle {
        account: Arc::new(Account {
            inbound: Mutex::new(Some(inbound)),
            delivered: delivered_tx,
            stuck: AtomicBool::new(false),
            sending: Notify::new(),
            stopped: AtomicBool::new(false),
        }),
        events,
        delivered,
    }
}

fn private_event(user_id: i64, text: Option<&str>, media: Option<Media>) -> InboundEvent {
    InboundEvent {
        message_id: 1,
        chat: Chat {
            id: user_id,
            private: true,
        },
        sender: Sender {
            id: user_id,
            username: Some("tester".to_string()),
            display_name: "Tester".to_string(),
            is_bot: false,
        },
        text: text.map(str::to_string),
        media,
        inline_query: None,
        reply_to: None,
    }
}

fn group_event(chat_id: i64, user_id: i64, message_id: i32, text: &str) -> InboundEvent {
    InboundEvent {
        message_id,
        chat: Chat {
            id: chat_id,
            private: false,
        },
        sender: Sender {
            id: user_id,
            username: Some("tester".to_string()),
            display_name: "Tester".to_string(),
            is_bot: false,
        },
        text: Some(text.to_string()),
        media: None,
        inline_query: None,
        reply_to: None,
    }
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Deliverable>) -> Deliverable {
    match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        Ok(Some(deliverable)) => deliverable,
        other => panic!("expected a deliverable, got {other:?}"),
    }
}

#[tokio::test]
async fn pending_add_carries_across_accounts() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    let mut first = account();
    let mut second = account();

    let mut swapper = Swapper::new(store.clone());
    swapper.add_account(first.account.clone());
    swapper.add_account(second.account.clone());
    assert_eq!(swapper.accounts(), 2);

    let cancel = CancellationToken::new();
    let running = tokio::spawn(swapper.run(cancel.clone()));

    first
        .events
        .send(private_event(9, Some("/add meow"), None))
        .await
        .expect("send to first account");
    assert_eq!(
        next(&mut first.delivered).await,
        Deliverable::text(9, views::add_prompt("meow"))
    );

    let sticker = Media {
        file_id: "file-m".to_string(),
        unique_id: "uid-m".to_string(),
    };
    second
        .events
        .send(private_event(9, None, Some(sticker)))
        .await
        .expect("send to second account");
    assert_eq!(
        next(&mut second.delivered).await,
        Deliverable::text(9, views::added("meow"))
    );

    let mapped = store.get_mapping(9, "meow").await.expect("lookup");
    assert_eq!(mapped.as_deref(), Some("file-m"));

    cancel.cancel();
    let result = running.await.expect("swapper join");
    assert!(result.is_ok());
    assert!(first.account.stopped.load(Ordering::SeqCst));
    assert!(second.account.stopped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn one_account_failing_stops_the_others() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    let healthy = account();
    let failing = account();

    let mut swapper = Swapper::new(store);
    swapper.add_account(healthy.account.clone());
    swapper.add_account(failing.account.clone());
    drop(failing.events);

    let result = swapper.run(CancellationToken::new()).await;
    assert!(result.is_err());
    assert!(healthy.account.stopped.load(Ordering::SeqCst));
    assert!(failing.account.stopped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn running_without_accounts_fails() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    let swapper = Swapper::new(store);
    assert!(swapper.run(CancellationToken::new()).await.is_err());
}

#[tokio::test]
async fn rate_limit_is_shared_between_accounts() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    let media = Media {
        file_id: "file-m".to_string(),
        unique_id: "uid-m".to_string(),
    };
    store.upsert_mapping(9, "meow", &media).await.expect("mapping");
    store.set_limit(-100, 2).await.expect("limit");
    store.set_timeout(-100, 600).await.expect("timeout");

    let mut first = account();
    let mut second = account();
    let mut swapper = Swapper::new(store);
    swapper.add_account(first.account.clone());
    swapper.add_account(second.account.clone());
    let cancel = CancellationToken::new();
    let running = tokio::spawn(swapper.run(cancel.clone()));

    for (handle, message_id) in [(&first, 1), (&second, 2), (&first, 3)] {
        handle
            .events
            .send(group_event(-100, 9, message_id, "meow"))
            .await
            .expect("group event");
    }
    // Each account answers in order, so the greeting trails every swap it made.
    let mut swaps = 0;
    for handle in [&mut first, &mut second] {
        handle
            .events
            .send(private_event(9, Some("/start"), None))
            .await
            .expect("private event");
        loop {
            match next(&mut handle.delivered).await {
                Deliverable::MediaShare { file_id, .. } => {
                    assert_eq!(file_id, "file-m");
                    swaps += 1;
                }
                Deliverable::Text { text, .. } if text == views::GREETING => break,
                Deliverable::Text { .. } | Deliverable::InlineAnswer { .. } => {}
            }
        }
    }
    assert_eq!(swaps, 2);

    cancel.cancel();
    assert!(running.await.expect("swapper join").is_ok());
}

#[tokio::test(start_paused = true)]
async fn cancellation_is_not_held_up_by_a_stuck_delivery() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    let stuck = account();
    let healthy = account();
    stuck.account.stuck.store(true, Ordering::SeqCst);

    let mut swapper = Swapper::new(store);
    swapper.add_account(stuck.account.clone());
    swapper.add_account(healthy.account.clone());
    let cancel = CancellationToken::new();
    let running = tokio::spawn(swapper.run(cancel.clone()));

    stuck
        .events
        .send(private_event(9, Some("/start"), None))
        .await
        .expect("private event");
    stuck.account.sending.notified().await;

    cancel.cancel();
    match tokio::time::timeout(SHUTDOWN_GRACE * 2, running).await {
        Ok(joined) => assert!(joined.expect("swapper join").is_ok()),
        Err(_) => panic!("swapper still running after cancellation"),
    }
    assert!(stuck.account.stopped.load(Ordering::SeqCst));
    assert!(healthy.account.stopped.load(Ordering::SeqCst));
}
