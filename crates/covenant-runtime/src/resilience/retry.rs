//! Backoff policy for transient enrichment failures.

use backon::ExponentialBuilder;

use crate::config::RetryConfig;

/// Exponential backoff built from the retry settings.
///
/// `max_retries` counts retries after the first call, so zero means a
/// single attempt.
pub fn backoff(config: &RetryConfig) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(config.min_delay)
        .with_max_delay(config.max_delay.max(config.min_delay))
        .with_max_times(config.max_retries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backon::Retryable;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn quick(max_retries: usize) -> RetryConfig {
        RetryConfig {
            max_retries,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let result = (move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err("flaky")
            } else {
                Ok(7)
            }
        })
        .retry(backoff(&quick(3)))
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_call() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let result: Result<(), &str> = (move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err("down")
        })
        .retry(backoff(&quick(0)))
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_count_excludes_first_call() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let config = RetryConfig {
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            ..RetryConfig::default()
        };

        let result: Result<(), &str> = (move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err("down")
        })
        .retry(backoff(&config))
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), config.max_retries + 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
