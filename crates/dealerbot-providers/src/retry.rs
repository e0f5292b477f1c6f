//! Per-call timeout and optional retry-with-backoff around a completion.
//!
//! The default policy makes no retries: an infrastructural failure ends
//! the caller's turn immediately.

use std::time::Duration;

use tracing::warn;

use crate::error::CompletionError;
use crate::traits::CompletionClient;

/// Upper bound for a single backoff sleep.
const MAX_DELAY: Duration = Duration::from_secs(60);

/// Retry behaviour for transient completion failures.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. 0 disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    /// Delay before retry number `attempt` (0-based).
    ///
    /// A server-provided `Retry-After` wins over the computed backoff.
    pub fn delay_for(&self, attempt: u32, error: &CompletionError) -> Duration {
        if let Some(after) = error.retry_after() {
            return after.min(MAX_DELAY);
        }
        let multiplier = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(multiplier).min(MAX_DELAY)
    }
}

/// Run one completion with a per-attempt timeout, retrying transient
/// failures according to `policy`.
pub async fn complete_with_policy(
    client: &dyn CompletionClient,
    prompt: &str,
    timeout: Duration,
    policy: &RetryPolicy,
) -> Result<String, CompletionError> {
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(timeout, client.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout(timeout)),
        };

        match result {
            Ok(text) => return Ok(text),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt, &e);
                warn!(
                    provider = client.display_name(),
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient completion failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
