//! Bounded retry loop shared by every write against the notes API.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::backoff::BackoffPolicy;
use crate::error::{Result, SyncError};

/// Retry configuration for save operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first. Must be at least 1.
    pub max_retries: u32,
    /// Base delay for the exponential backoff schedule.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Runs `operation` until it succeeds, fails fatally, or spends the budget.
///
/// Attempts are strictly sequential. A fatal error propagates unmodified on
/// the attempt it occurs; a transient error consumes one attempt and, while
/// budget remains, sleeps the backoff delay before the next try. When the
/// budget runs out the last transient cause is wrapped in
/// [`SyncError::RetriesExhausted`].
pub async fn run_with_retry<T, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let policy = BackoffPolicy::new(config.base_delay);
    let budget = config.max_retries.max(1);
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() {
                    return Err(err);
                }

                let attempts_made = attempt + 1;
                if attempts_made >= budget {
                    return Err(SyncError::RetriesExhausted {
                        attempts: attempts_made,
                        source: Box::new(err),
                    });
                }

                let wait = policy.delay(attempt);
                warn!(
                    attempt = attempts_made,
                    wait_ms = wait.as_millis() as u64,
                    error = %err,
                    "save attempt failed, backing off"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}
