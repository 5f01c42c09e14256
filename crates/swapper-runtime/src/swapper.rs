use crate::pipeline::DispatchPipeline;
use anyhow::{bail, Result};
use std::sync::Arc;
use swapper_core::{ChatTransport, Dispatcher, SharedState, SwapStore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Runs every configured bot account over one store and one [`SharedState`].
///
/// Rate limits, pending private-chat actions and cached settings are shared,
/// so users get the same behavior whichever account they talk to.
pub struct Swapper {
    dispatcher: Dispatcher,
    accounts: Vec<Arc<dyn ChatTransport>>,
}

fn flatten(joined: Result<Result<()>, JoinError>) -> Result<()> {
    joined?
}

impl Swapper {
    /// Controller over `store` with fresh shared state.
    #[must_use]
    pub fn new(store: Arc<dyn SwapStore>) -> Self {
        Self::with_state(store, Arc::new(SharedState::new()))
    }

    /// Controller over `store` and an existing `state`.
    #[must_use]
    pub fn with_state(store: Arc<dyn SwapStore>, state: Arc<SharedState>) -> Self {
        Self {
            dispatcher: Dispatcher::new(store, state),
            accounts: Vec::new(),
        }
    }

    /// Register one bot account.
    pub fn add_account(&mut self, transport: Arc<dyn ChatTransport>) {
        self.accounts.push(transport);
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn accounts(&self) -> usize {
        self.accounts.len()
    }

    /// Run all pipelines until `cancel` fires or one of them exits.
    ///
    /// Either way every pipeline is cancelled and joined before returning.
    ///
    /// # Errors
    ///
    /// Returns the first pipeline failure, or an error when no account is
    /// registered.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        if self.accounts.is_empty() {
            bail!("no accounts registered");
        }

        let shutdown = cancel.child_token();
        let mut pipelines = JoinSet::new();
        for (account, transport) in self.accounts.into_iter().enumerate() {
            let pipeline = DispatchPipeline::new(account, transport, self.dispatcher.clone());
            pipelines.spawn(pipeline.run(shutdown.clone()));
        }
        info!(accounts = pipelines.len(), "Swapper running");

        let mut outcome = Ok(());
        tokio::select! {
            () = cancel.cancelled() => info!("Shutdown requested"),
            Some(first) = pipelines.join_next() => outcome = flatten(first),
        }
        shutdown.cancel();

        while let Some(joined) = pipelines.join_next().await {
            if let Err(e) = flatten(joined) {
                if outcome.is_ok() {
                    outcome = Err(e);
                } else {
                    error!(error = %e, "Pipeline failed during shutdown");
                }
            }
        }
        info!("All pipelines stopped");
        outcome
    }
}
