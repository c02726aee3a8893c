//! Whole-product retry with exponential backoff.
//!
//! A retry never resumes mid-flow: the operation passed in is expected to
//! re-navigate from a known page before searching again, since a click that
//! already landed cannot be undone.

use std::future::Future;
use std::time::Duration;

use avsc_scraper::ScraperError;

/// Only waits that ran out and pages that failed to load are worth another
/// attempt; a missing country or a broken page structure will fail the same
/// way again.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::Timeout { .. } | ScraperError::Navigation { .. }
    )
}

/// Runs `operation`, retrying retriable failures up to `max_retries` times.
///
/// The sleep before retry `n` (counting from zero) is
/// `backoff_base_secs * 2^n` seconds, so `max_retries = 2` with a base of 2
/// attempts at most three times, sleeping 2 s then 4 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            stage = %err.stage(),
            error = %err,
            "transient scrape failure, retrying from a fresh page"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
