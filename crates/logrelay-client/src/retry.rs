use std::time::Duration;

use reqwest::StatusCode;
use tracing::warn;

use crate::error::{ClientError, Result};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 12;

/// Default delay before the first retry. Doubles on each further retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);

/// Default ceiling for the retry delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// How many times, and how patiently, to retry a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Default policy with a different retry count.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Total attempts, including the first.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (zero-based), exponential and capped.
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << retry.min(16))
            .min(self.max_delay)
    }

    /// Wait before the next attempt, or give up with `err` once attempts are spent.
    ///
    /// `attempt` is the zero-based index of the attempt that just failed.
    pub(crate) async fn backoff(&self, attempt: u32, url: &str, err: ClientError) -> Result<()> {
        if attempt >= self.max_retries {
            return Err(ClientError::RetriesExhausted {
                attempts: attempt + 1,
                last: Box::new(err),
            });
        }
        let delay = self.delay(attempt);
        warn!(
            url,
            retry = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "request failed, retrying"
        );
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

/// Gateway statuses a proxy in front of the relay returns while it is unavailable.
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Transport failures worth another attempt: connect, timeout, and dropped connections.
///
/// Builder and redirect errors are not.
pub fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect()
        || error.is_timeout()
        || error.is_request()
        || error.is_body()
        || error.is_decode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_documented_constants() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 12);
        assert_eq!(policy.attempts(), 13);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
    }

    #[test]
    fn delay_doubles_then_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(250));
        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(3), Duration::from_secs(2));
        assert_eq!(policy.delay(6), Duration::from_secs(10));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn only_gateway_statuses_are_retryable() {
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::CONFLICT));
        assert!(!is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    fn gateway_error() -> ClientError {
        ClientError::UnexpectedStatus(StatusCode::BAD_GATEWAY)
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_sleeps_until_attempts_are_spent() {
        let policy = RetryPolicy::with_max_retries(1);
        let start = tokio::time::Instant::now();

        policy
            .backoff(0, "http://relay/log/a", gateway_error())
            .await
            .expect("first failure should be retried");
        assert!(start.elapsed() >= Duration::from_millis(250));

        let err = policy
            .backoff(1, "http://relay/log/a", gateway_error())
            .await
            .expect_err("second failure should give up");
        match err {
            ClientError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(
                    *last,
                    ClientError::UnexpectedStatus(StatusCode::BAD_GATEWAY)
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
