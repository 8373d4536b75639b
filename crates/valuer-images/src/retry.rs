//! Retry with exponential backoff for image fetching.
//!
//! Wraps the whole multi-strategy fetch chain: a transient failure
//! (network error, 5xx) re-runs the chain after a backoff delay, while
//! content failures (404, non-image body) are returned immediately —
//! retrying those would return the same result.

use std::future::Future;
use std::time::Duration;

use crate::error::ImageError;

/// Hard cap on the backoff delay.
const MAX_DELAY_MS: u64 = 10_000;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable errors:
/// - [`ImageError::Transport`] — network-level failure (connection reset, timeout, etc.).
/// - [`ImageError::Blocked`] with a 5xx status — transient server/CDN error.
/// - [`ImageError::Exhausted`] whose recorded cause is itself retriable.
///
/// Non-retriable errors (propagated immediately):
/// - [`ImageError::NotFound`] — 404; retrying would return the same result.
/// - [`ImageError::Blocked`] with a 4xx status — the CDN made a decision.
/// - [`ImageError::NotAnImage`] — wrong content; the strategy chain already moved past it.
/// - [`ImageError::Decode`] / [`ImageError::Storage`] — not fetch errors at all.
pub(crate) fn is_retriable(err: &ImageError) -> bool {
    match err {
        ImageError::Transport { .. } => true,
        ImageError::Blocked { status, .. } => *status >= 500,
        ImageError::Exhausted { source, .. } => is_retriable(source),
        _ => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retriable error the function sleeps for
/// `backoff_base_ms * 2^attempt` milliseconds (capped at 10 s) and tries
/// again, up to `max_retries` additional attempts after the first try. If
/// all retries are exhausted the last error is returned.
///
/// # Backoff schedule (example with `backoff_base_ms = 2000`)
///
/// | Attempt | Sleep before next attempt |
/// |---------|--------------------------|
/// | 0 (initial) | — (no sleep before first try) |
/// | 1 (first retry) | 2 000 ms × 2⁰ = 2 s |
/// | 2 (second retry) | 2 000 ms × 2¹ = 4 s |
///
/// Non-retriable errors are returned immediately without sleeping.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ImageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ImageError>>,
{
    let mut last_err;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                last_err = err;
            }
        }

        let delay_ms = backoff_base_ms
            .saturating_mul(1u64 << attempt.min(62))
            .min(MAX_DELAY_MS);
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %last_err,
            "transient image fetch error — retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}
