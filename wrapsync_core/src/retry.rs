//! Bounded retry of whole store operations
//!
//! Every attempt restarts the operation from scratch. The outcome carries the
//! number of failed attempts so callers can aggregate retry statistics without
//! any shared counters.

use crate::error::{Error, Result, StoreError, ValidationError};
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// How often and how patiently an operation is attempted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay between attempts, multiplied by the attempt number
    pub delay: Duration,
    /// Upper bound for a single attempt
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_attempt_timeout(mut self, limit: Option<Duration>) -> Self {
        self.attempt_timeout = limit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ValidationError::invalid_configuration(
                "max_attempts must be at least 1",
            )
            .into());
        }
        if self.attempt_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ValidationError::invalid_configuration(
                "attempt timeout must be greater than 0",
            )
            .into());
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            delay: Duration::ZERO,
            attempt_timeout: None,
        }
    }
}

/// Result of a bounded-retry operation
///
/// `result` is `None` once the attempt budget is spent. `retries` counts the
/// failed attempts, so a first-try success reports zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome<T> {
    pub result: Option<T>,
    pub retries: u32,
}

impl<T> RetryOutcome<T> {
    pub fn is_exhausted(&self) -> bool {
        self.result.is_none()
    }
}

/// Run `attempt` until it succeeds or the policy's attempt budget is spent
///
/// The closure receives the zero-based attempt number. Every error counts as a
/// failed attempt; an attempt exceeding `attempt_timeout` is abandoned and
/// counted as a timeout.
pub async fn with_retries<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt: F,
) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0;

    for attempt_no in 0..policy.max_attempts {
        if attempt_no > 0 && !policy.delay.is_zero() {
            let wait = policy.delay * attempt_no;
            debug!("{operation}: waiting {wait:?} before attempt {}", attempt_no + 1);
            sleep(wait).await;
        }

        let result = match policy.attempt_timeout {
            Some(limit) => match timeout(limit, attempt(attempt_no)).await {
                Ok(result) => result,
                Err(_) => Err(Error::Store(StoreError::Timeout(limit))),
            },
            None => attempt(attempt_no).await,
        };

        match result {
            Ok(value) => {
                if retries > 0 {
                    debug!("{operation}: succeeded after {retries} retries");
                }
                return RetryOutcome {
                    result: Some(value),
                    retries,
                };
            }
            Err(e) => {
                retries += 1;
                let transient = e.is_retryable();
                warn!(
                    "{operation}: attempt {}/{} failed ({}): {e}",
                    attempt_no + 1,
                    policy.max_attempts,
                    if transient { "transient" } else { "unclassified" }
                );
            }
        }
    }

    warn!("{operation}: giving up after {retries} failed attempts");
    RetryOutcome {
        result: None,
        retries,
    }
}
