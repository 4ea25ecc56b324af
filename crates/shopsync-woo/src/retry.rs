//! Retry with exponential back-off and jitter for store calls.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors. Client-side errors (4xx, deserialization failures) are
//! returned immediately; retrying cannot fix a payload the store considers
//! invalid.

use std::future::Future;
use std::time::Duration;

use crate::error::WooError;

/// Returns `true` for errors worth retrying after a back-off delay.
///
/// **Retriable:** network-level failures (timeout, connection reset) and 5xx
/// responses.
///
/// **Not retriable:** 4xx responses, deserialization failures, and
/// configuration errors.
#[must_use]
pub fn is_retriable(err: &WooError) -> bool {
    match err {
        WooError::Transport(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        WooError::Rejected { status, .. } => status.is_server_error(),
        WooError::Deserialize { .. } | WooError::InvalidBaseUrl(_) => false,
    }
}

/// Back-off delay before retry number `attempt` (1-based): base × 2^(n−1)
/// with ±25 % jitter, capped at 60 s.
#[must_use]
pub fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    const MAX_DELAY_MS: u64 = 60_000;
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    jittered
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors. Non-retriable errors return immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, WooError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WooError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = backoff_delay_ms(backoff_base_ms, attempt);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient store error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
