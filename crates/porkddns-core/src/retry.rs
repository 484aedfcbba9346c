//! Bounded, fixed-delay retry
//!
//! Components own *which* failures are transient; this module owns *how many*
//! attempts are made and how long to wait between them.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Attempt bound and inter-attempt delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Pause between a failed attempt and the next one
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Single attempt, no retries
    pub const fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(60))
    }
}

/// Run `attempt` until it succeeds, fails with a non-retryable error, or the
/// policy's attempt bound is reached.
///
/// Only errors for which `is_retryable` returns true are retried. Exhausting
/// the bound yields [`Error::RetryExhausted`] wrapping the last error; any
/// other error is returned unchanged.
pub async fn retry_with_policy<T, F, Fut, P>(
    operation: &str,
    policy: &RetryPolicy,
    is_retryable: P,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&Error) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt_no in 1..=max_attempts {
        match attempt().await {
            Ok(value) => {
                if attempt_no > 1 {
                    debug!("{} succeeded on attempt {}", operation, attempt_no);
                }
                return Ok(value);
            }
            Err(e) if is_retryable(&e) => {
                if attempt_no == max_attempts {
                    return Err(Error::retry_exhausted(operation, attempt_no, e));
                }
                warn!(
                    "{} attempt {}/{} failed: {}. Retrying in {:?}",
                    operation, attempt_no, max_attempts, e, policy.delay
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("retry loop always returns within max_attempts iterations")
}
