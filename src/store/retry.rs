//! Bounded retry for transient storage contention.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

/// A bounded retry policy with fixed backoff.
///
/// Targets transient OS-level file contention (another process briefly
/// holding a handle on an artifact). It is not a defense against
/// concurrent writers: a save racing another save is last-writer-wins.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Run `operation` until it succeeds or attempts are exhausted.
    ///
    /// Each failed attempt is logged with its attempt number; the final
    /// error is returned unchanged so callers decide how to report it.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut operation: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if attempt >= self.max_attempts {
                        warn!(what, attempt, error = %error, "Giving up after final attempt");
                        return Err(error);
                    }
                    warn!(what, attempt, error = %error, "Attempt failed, retrying");
                    sleep(self.backoff).await;
                }
            }
        }
    }
}
