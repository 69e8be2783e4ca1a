//! Saga configuration

use std::time::Duration;

use crate::RetryPolicy;

/// Settings shared by every node action of a saga
#[derive(Clone, Debug, PartialEq)]
pub struct SagaConfig {
    /// Retry policy for every node call
    pub retry: RetryPolicy,
    /// Per-request timeout, `None` leaves it to the transport
    pub request_timeout: Option<Duration>,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl SagaConfig {
    /// Create config from environment variables.
    ///
    /// - `GROUP_SAGA_MAX_ATTEMPTS`: calls per node operation (default: 3)
    /// - `GROUP_SAGA_RETRY_DELAY_MS`: delay before the first retry (default: 100)
    /// - `GROUP_SAGA_REQUEST_TIMEOUT_SECS`: request timeout, 0 disables it (default: 30)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let max_attempts = lookup("GROUP_SAGA_MAX_ATTEMPTS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.retry.max_attempts);

        let initial_delay_millis = lookup("GROUP_SAGA_RETRY_DELAY_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.retry.initial_delay_millis);

        let request_timeout = match lookup("GROUP_SAGA_REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.request_timeout,
        };

        Self {
            retry: RetryPolicy {
                max_attempts,
                initial_delay_millis,
                ..defaults.retry
            },
            request_timeout,
        }
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}
