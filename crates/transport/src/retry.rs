//! Bounded retry for transient transport failures
//!
//! One policy applies to every call the transport makes: a fixed number of
//! attempts with a fixed wait between them, retrying only timeouts and
//! connection failures. HTTP error statuses are returned immediately.

use std::future::Future;
use std::time::Duration;

use common::RetryConfig;
use tracing::warn;

use crate::error::Result;

/// Fixed-count, fixed-wait retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            wait: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            wait: Duration::ZERO,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            wait: Duration::from_secs(config.wait_secs),
        }
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are used up. The last error is returned as-is.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                warn!(
                    attempt,
                    max_attempts,
                    code = %e.code,
                    wait_ms = policy.wait.as_millis() as u64,
                    "transient gateway failure, retrying"
                );
                tokio::time::sleep(policy.wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorCode};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_timeouts_up_to_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&RetryPolicy::default(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::timeout())
        })
        .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::RequestTimeout);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_fixed_interval_between_attempts() {
        let start = tokio::time::Instant::now();
        let _: Result<()> = with_retry(&RetryPolicy::default(), || async {
            Err(Error::connection())
        })
        .await;
        // Two waits of 2s between three attempts
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&RetryPolicy::default(), || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::connection())
            } else {
                Ok("ok")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn never_retries_http_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&RetryPolicy::default(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::http(400, "", serde_json::json!({})))
        })
        .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::Http(400));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn none_policy_makes_single_attempt() {
        let calls = AtomicU32::new(0);
        let _: Result<()> = with_retry(&RetryPolicy::none(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::timeout())
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn from_config_clamps_zero_attempts() {
        let policy = RetryPolicy::from_config(&RetryConfig {
            max_attempts: 0,
            wait_secs: 5,
        });
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.wait, Duration::from_secs(5));
    }
}
