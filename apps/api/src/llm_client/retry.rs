//! Retry with exponential backoff for outbound calls that can fail transiently.
//!
//! The policy is generic over the operation and its error type: anything whose
//! error implements [`TransientFailure`] can be wrapped. Both analysis stages
//! share the same wrapper and the same policy.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, warn};

/// Failure kinds for which a blind retry is a reasonable recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransientKind {
    /// Rate limit or quota exhausted (HTTP 429).
    RateLimited,
    /// Overloaded or temporarily unreachable service.
    Unavailable,
    /// The request timed out.
    DeadlineExceeded,
}

impl fmt::Display for TransientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransientKind::RateLimited => "rate limited",
            TransientKind::Unavailable => "service unavailable",
            TransientKind::DeadlineExceeded => "deadline exceeded",
        };
        f.write_str(name)
    }
}

/// Classifies an error for the retry predicate. `None` means permanent.
pub trait TransientFailure {
    fn transient_kind(&self) -> Option<TransientKind>;
}

/// Attempt budget and delay schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            initial_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay slept before `attempt` (1-indexed): `initial_delay * backoff_factor^(attempt-2)`.
    /// The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        self.initial_delay
            .mul_f64(self.backoff_factor.powi(attempt as i32 - 2))
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed transiently. Carries the last failure.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// A non-transient failure, returned from the attempt that hit it.
    #[error("{0}")]
    Permanent(E),
}

/// Runs `op` until it succeeds, fails permanently, or the attempt budget runs out.
///
/// A transient failure with attempts remaining sleeps for
/// [`RetryPolicy::delay_before`] the next attempt. Nothing sleeps after the
/// final attempt. `label` names the call site in log events.
pub async fn with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: TransientFailure + fmt::Display,
{
    let max_attempts = policy.retries.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let Some(kind) = err.transient_kind() else {
            return Err(RetryError::Permanent(err));
        };

        if attempt >= max_attempts {
            error!(
                attempt,
                kind = %kind,
                "{label} failed after {attempt} attempts, giving up: {err}"
            );
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        let delay = policy.delay_before(attempt + 1);
        warn!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            kind = %kind,
            "{label} failed with {kind}, attempt {attempt} of {max_attempts}. Retrying in {:.1}s...",
            delay.as_secs_f64()
        );
        tokio::time::sleep(delay).await;
    }
}
