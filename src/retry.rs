//! Bounded retry around a single node call

use std::future::Future;

use tracing::warn;

use crate::{NodeError, Operation};

/// Retry policy for node calls.
///
/// Only [`NodeError::Failed`] is retried. A 404 on the status probe is a
/// valid answer and is returned after the single call that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of calls, including the first one
    pub max_attempts: u32,
    /// Delay before the second call (milliseconds)
    pub initial_delay_millis: u64,
    /// Maximum delay cap (milliseconds)
    pub max_delay_millis: u64,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_millis: 100,
            max_delay_millis: 2000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` calls with no delay in between
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay_millis: 0,
            max_delay_millis: 0,
            backoff_multiplier: 1.0,
        }
    }

    /// Calculate delay after a failed attempt (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> std::time::Duration {
        if attempt == 0 {
            return std::time::Duration::from_millis(0);
        }

        let delay = self.initial_delay_millis as f64
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let capped = delay.min(self.max_delay_millis as f64);
        std::time::Duration::from_millis(capped as u64)
    }

    /// Run `call` until it succeeds, fails with a non-retriable error, or the
    /// attempt budget is spent. Attempts are strictly sequential.
    pub async fn run<F, Fut, T>(&self, operation: Operation, mut call: F) -> Result<T, NodeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, NodeError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_retriable() => return Err(error),
                Err(error) if attempt >= max_attempts => {
                    return Err(NodeError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }
                Err(error) => {
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        node = %error.node(),
                        operation = %operation,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Node call failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
