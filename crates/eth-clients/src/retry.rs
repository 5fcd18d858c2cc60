//! Retry logic with exponential backoff for node and service HTTP calls.
//!
//! Retries only on transient failures (connection errors, timeouts, HTTP 5xx
//! and 429). Everything else is returned immediately without retry.

use std::future::Future;

use crate::config::RetryPolicy;
use crate::error::ClientError;

/// Run `f` until it succeeds, fails with a non-transient error, or the
/// policy runs out of retries.
///
/// The closure is called up to `policy.max_retries + 1` times. A transient
/// failure on the last attempt is wrapped in
/// [`ClientError::RetriesExhausted`].
pub(crate) async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    endpoint: &str,
    f: F,
) -> Result<T, ClientError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) if attempt >= policy.max_retries => {
                return Err(ClientError::RetriesExhausted {
                    endpoint: endpoint.to_string(),
                    attempts: attempt + 1,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                attempt += 1;
                tracing::warn!(
                    endpoint,
                    attempt,
                    max_retries = policy.max_retries,
                    "request failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
