//! Resilient request layer
//!
//! [`executor`] performs one classified attempt; [`execute_with_retry`] wraps
//! it with a bounded, fixed-delay retry loop for transient failures. The
//! delay curve is flat, not exponential: the console issues a small, known
//! request volume against a single operator-controlled backend.

pub mod error;
pub mod executor;

use std::time::Duration;

use reqwest::Client;
use tracing::warn;

pub use error::{FetchError, Result};
pub use executor::{execute, FetchSuccess, RequestSpec};

/// Bounded retry policy: at most `max_attempts` attempts, spaced by exactly
/// `delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 7, delay: Duration::from_millis(1000) }
    }
}

/// Repeatedly invoke the executor until success, a non-transient failure, or
/// exhaustion of the attempt budget.
///
/// On exhaustion the *last* failure is returned with its `transient` flag
/// intact, so callers can offer a manual retry. A manual retry is simply a
/// new call; the attempt counter restarts at 1.
pub async fn execute_with_retry(
    client: &Client,
    spec: &RequestSpec,
    policy: RetryPolicy,
) -> Result<FetchSuccess> {
    let mut attempt = 1u32;
    loop {
        match executor::execute(client, spec).await {
            Ok(success) => return Ok(success),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                warn!(
                    url = %spec.url,
                    attempt,
                    max = policy.max_attempts,
                    "transient failure, retrying in {:?}: {e}",
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
