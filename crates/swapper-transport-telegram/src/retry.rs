//! Retry wrapper for Telegram API calls.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::warn;

/// First backoff delay in milliseconds.
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Longest backoff delay in milliseconds.
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Retries after the first attempt.
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

/// Retry a Telegram API operation with exponential backoff and jitter.
///
/// Returns the last error once every attempt has failed.
pub async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            attempts = TELEGRAM_API_MAX_RETRIES + 1,
            error = %e,
            "Telegram API operation failed"
        );
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let result = retry_telegram_operation(|| async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                anyhow::bail!("flaky network");
            }
            Ok(42)
        })
        .await;

        assert_eq!(result.ok(), Some(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let result: Result<()> = retry_telegram_operation(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("still down")
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), TELEGRAM_API_MAX_RETRIES + 1);
    }
}
