//! Bounded Retry
//!
//! Linear polling with a fixed interval and a fixed attempt cap. This is the
//! policy the bridge uses to wait for the engine's endpoint to appear; it is
//! kept generic so the probe (and, in tests, the clock) can be injected and
//! the policy verified without filesystem or process dependencies.
//!
//! Deliberately not exponential backoff: the engine either binds its socket
//! within a few hundred milliseconds or it never will, and exhausting the
//! budget is a terminal failure for the caller.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fixed-interval, bounded-attempt retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay between consecutive probes.
    pub interval: Duration,
    /// Maximum number of probes before giving up.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(200),
            max_attempts: 20,
        }
    }
}

impl RetryPolicy {
    /// Set the probe interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the attempt cap.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// A policy suitable for tests (short interval, few attempts).
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            interval: Duration::from_millis(10),
            max_attempts: 5,
        }
    }
}

/// The retry budget was consumed without the operation succeeding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Exhausted {
    /// How many probes were made.
    pub attempts: u32,
}

/// Run `op` until it yields a value, probing at most `policy.max_attempts`
/// times with `policy.interval` between consecutive probes.
///
/// The first probe runs immediately: if the operation already succeeds, no
/// sleep is taken at all. There is no sleep after the final failed probe.
///
/// # Errors
///
/// Returns [`Exhausted`] once the attempt cap is reached.
pub async fn retry_with_policy<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, Exhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=policy.max_attempts {
        if let Some(value) = op(attempt).await {
            return Ok(value);
        }
        tracing::debug!(attempt, max = policy.max_attempts, "probe failed, retrying");
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Err(Exhausted {
        attempts: policy.max_attempts,
    })
}
