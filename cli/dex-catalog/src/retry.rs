//! Retry decisions and cancellable waiting.
//!
//! Retries are decided in exactly one place, [RetryPolicy::should_retry],
//! which is driven by [is_retryable].

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::DexError;

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(800);

/// Whether a failed request should be re-issued.
pub fn is_retryable(error: &DexError) -> bool {
    error.is_retryable()
}

/// Linear backoff: the n-th retry waits `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn never() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before the `retry`-th retry (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }

    /// `retries` is the number of retries already performed.
    pub fn should_retry(&self, error: &DexError, retries: u32) -> bool {
        retries < self.max_retries && is_retryable(error)
    }
}

/// Run `fut` unless `cancel` fires first, in which case [DexError::Aborted]
/// is returned and `fut` is dropped.
pub async fn abortable<T>(
    cancel: Option<&CancellationToken>,
    fut: impl Future<Output = Result<T, DexError>>,
) -> Result<T, DexError> {
    let Some(cancel) = cancel else {
        return fut.await;
    };
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DexError::Aborted),
        result = fut => result,
    }
}

/// Sleep for `duration`, failing with [DexError::Aborted] as soon as
/// `cancel` fires.
pub async fn sleep_with_cancel(
    duration: Duration,
    cancel: Option<&CancellationToken>,
) -> Result<(), DexError> {
    abortable(cancel, async {
        tokio::time::sleep(duration).await;
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn verdict_agrees_with_error() {
        let errors = [
            DexError::network(),
            DexError::api(StatusCode::BAD_REQUEST),
            DexError::api(StatusCode::BAD_GATEWAY),
            DexError::validation("bad"),
            DexError::Aborted,
            DexError::unknown("what"),
        ];
        for error in errors {
            assert_eq!(is_retryable(&error), error.is_retryable(), "{error:?}");
        }
    }

    #[test]
    fn backoff_is_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(800));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1600));
    }

    #[test]
    fn stops_after_max_retries() {
        let policy = RetryPolicy::default();
        let error = DexError::api(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(policy.should_retry(&error, 0));
        assert!(policy.should_retry(&error, 1));
        assert!(!policy.should_retry(&error, 2));
    }

    #[test]
    fn client_errors_are_never_retried() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(&DexError::api(StatusCode::NOT_FOUND), 0));
        assert!(!policy.should_retry(&DexError::Aborted, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_without_token() {
        sleep_with_cancel(Duration::from_secs(5), None).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_sleep_aborts() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let result = sleep_with_cancel(Duration::from_secs(60), Some(&token)).await;
        assert_eq!(result, Err(DexError::Aborted));
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn already_cancelled_token_wins() {
        let token = CancellationToken::new();
        token.cancel();
        let result = abortable(Some(&token), async { Ok(1) }).await;
        assert_eq!(result, Err(DexError::Aborted));
    }
}
