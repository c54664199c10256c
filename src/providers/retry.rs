// Retry logic with exponential backoff

use anyhow::Result;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

const MAX_RETRIES: u32 = 3;
const BASE_DELAY_MS: u64 = 1000;

/// HTTP-level failure from a provider, classified for retrying.
#[derive(Debug, Error)]
#[error("{provider} API request failed\n\nStatus: {status}\nBody: {body}")]
pub struct ProviderStatusError {
    pub provider: String,
    pub status: u16,
    pub body: String,
}

impl ProviderStatusError {
    /// Rate limits and server-side failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        self.status == 429 || self.status >= 500
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }
}

/// Transient statuses and transport failures are retried. Malformed
/// responses and local errors are not.
fn is_retryable(error: &anyhow::Error) -> bool {
    if let Some(status) = error.downcast_ref::<ProviderStatusError>() {
        return status.is_transient();
    }
    match error.downcast_ref::<reqwest::Error>() {
        // connect, timeout, truncated body
        Some(http) => !http.is_decode() && !http.is_builder(),
        None => false,
    }
}

/// Execute a function with exponential backoff retry logic
pub async fn with_retry<F, Fut, T>(policy: RetryPolicy, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;
                if attempt >= attempts || !is_retryable(&e) {
                    return Err(e);
                }

                let delay = policy.base_delay * 2u32.pow(attempt - 1);
                tracing::warn!(
                    "Request failed (attempt {}/{}), retrying in {:?}: {}",
                    attempt,
                    attempts,
                    delay,
                    e
                );
                sleep(delay).await;
            }
        }
    }
}
