use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;
use swapper_core::model::{Deliverable, InboundEvent};
use swapper_core::{ChatTransport, Dispatcher, Outbox};
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Why the receive task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiveEnd {
    Cancelled,
    StreamClosed,
}

/// Time the send task keeps delivering once cancellation is requested.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

async fn deliver(account: usize, transport: &dyn ChatTransport, deliverable: Deliverable) -> bool {
    match transport.send(deliverable).await {
        Ok(()) => true,
        Err(e) => {
            warn!(account, error = %e, "Delivery failed");
            false
        }
    }
}

/// Deliver what is still queued until the queue closes or `deadline` passes.
async fn drain(
    account: usize,
    transport: &dyn ChatTransport,
    outbound: &mut Receiver<Deliverable>,
    deadline: Instant,
) -> usize {
    let mut delivered = 0;
    loop {
        let deliverable = match timeout_at(deadline, outbound.recv()).await {
            Ok(Some(deliverable)) => deliverable,
            Ok(None) => return delivered,
            Err(_) => break,
        };
        match timeout_at(deadline, deliver(account, transport, deliverable)).await {
            Ok(ok) => delivered += usize::from(ok),
            Err(_) => break,
        }
    }
    outbound.close();
    warn!(
        account,
        dropped = outbound.len(),
        "Shutdown grace elapsed; dropping queued deliveries"
    );
    delivered
}

/// Spawn the send task: deliver queued items until every [`Outbox`] is gone
/// or `cancel` fires.
///
/// Delivery is best-effort; failures are logged and the task keeps draining.
/// After cancellation the in-flight item and whatever is still queued get
/// [`SHUTDOWN_GRACE`] to go out. Resolves to the number of items delivered.
pub fn spawn_send_task(
    account: usize,
    transport: Arc<dyn ChatTransport>,
    mut outbound: Receiver<Deliverable>,
    cancel: CancellationToken,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut delivered = 0;
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                next = outbound.recv() => next,
            };
            let Some(deliverable) = next else {
                debug!(account, delivered, "Send task drained");
                return delivered;
            };

            let send = deliver(account, transport.as_ref(), deliverable);
            tokio::pin!(send);
            let interrupted = tokio::select! {
                ok = &mut send => {
                    delivered += usize::from(ok);
                    false
                }
                () = cancel.cancelled() => true,
            };
            if interrupted {
                let deadline = Instant::now() + SHUTDOWN_GRACE;
                match timeout_at(deadline, &mut send).await {
                    Ok(ok) => delivered += usize::from(ok),
                    Err(_) => {
                        warn!(account, "Delivery abandoned at shutdown");
                        return delivered;
                    }
                }
                let drained = drain(account, transport.as_ref(), &mut outbound, deadline).await;
                return delivered + drained;
            }
        }

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        delivered += drain(account, transport.as_ref(), &mut outbound, deadline).await;
        debug!(account, delivered, "Send task stopped");
        delivered
    })
}

async fn receive_loop(
    account: usize,
    dispatcher: Dispatcher,
    transport: Arc<dyn ChatTransport>,
    mut inbound: Receiver<InboundEvent>,
    outbox: Outbox,
    cancel: CancellationToken,
) -> ReceiveEnd {
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return ReceiveEnd::Cancelled,
            next = inbound.recv() => next,
        };
        let Some(event) = next else {
            return ReceiveEnd::StreamClosed;
        };
        debug!(
            account,
            chat_id = event.chat.id,
            message_id = event.message_id,
            "Dispatching event"
        );
        dispatcher.dispatch(transport.as_ref(), event, &outbox).await;
    }
}

/// One bot account: a receive task feeding the handlers and a send task
/// draining the account's outbound queue.
pub struct DispatchPipeline {
    account: usize,
    transport: Arc<dyn ChatTransport>,
    dispatcher: Dispatcher,
}

impl DispatchPipeline {
    /// Pipeline for the account at position `account` in the configuration.
    #[must_use]
    pub fn new(
        account: usize,
        transport: Arc<dyn ChatTransport>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            account,
            transport,
            dispatcher,
        }
    }

    /// Connect and process events until `cancel` fires or the inbound stream ends.
    ///
    /// On the way out the in-flight handler finishes and the outbound queue is
    /// closed and drained within [`SHUTDOWN_GRACE`]. Both tasks are joined
    /// before the transport is stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails to connect, a task panics, or
    /// the inbound stream ends without cancellation.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let account = self.account;
        let inbound = self.transport.connect().await?;
        let (outbox, outbound) = Outbox::channel();

        let sender = spawn_send_task(
            account,
            Arc::clone(&self.transport),
            outbound,
            cancel.clone(),
        );
        let receiver = tokio::spawn(receive_loop(
            account,
            self.dispatcher,
            Arc::clone(&self.transport),
            inbound,
            outbox,
            cancel,
        ));
        info!(account, "Pipeline started");

        let received = receiver.await;
        let sent = sender.await;
        self.transport.stop().await;

        let delivered = sent.map_err(|e| {
            error!(account, error = %e, "Send task failed");
            anyhow!("account {account} send task failed: {e}")
        })?;
        match received {
            Ok(ReceiveEnd::Cancelled) => {
                info!(account, delivered, "Pipeline stopped");
                Ok(())
            }
            Ok(ReceiveEnd::StreamClosed) => {
                warn!(account, delivered, "Inbound stream closed");
                Err(anyhow!("account {account} stopped receiving"))
            }
            Err(e) => {
                error!(account, error = %e, "Receive task failed");
                Err(anyhow!("account {account} receive task failed: {e}"))
            }
        }
    }
}
