//! Retry policy for search source calls.

use std::future::Future;
use std::time::Duration;

use crate::error::SearchError;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Default delay between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// Retries transient search failures with a bounded number of attempts.
///
/// Only errors for which [`SearchError::is_transient`] holds are retried;
/// everything else is returned immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before every retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    /// Fixed-delay policy.
    #[must_use]
    pub const fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Runs `operation` until it succeeds, fails permanently, or the
    /// retry budget is spent. `label` names the call in retry logs.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted, or the first
    /// non-transient error.
    pub async fn run<F, Fut, T>(&self, label: &str, mut operation: F) -> Result<T, SearchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SearchError>>,
    {
        let mut retry = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retry < self.max_retries => {
                    tracing::warn!(
                        source = label,
                        attempt = retry + 1,
                        max_retries = self.max_retries,
                        backoff_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "search request failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
