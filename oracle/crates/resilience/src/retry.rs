//! Capped exponential backoff.
//!
//! Delay before retry `n` (1-based) is `base_delay * 2^(n-1)`, never more than
//! `max_delay`. The exponent is clamped so the multiplication cannot overflow.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

const MAX_EXPONENT: u32 = 16;

/// Configuration for a bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap for the exponential growth
    pub max_delay: Duration,
    /// Total number of attempts, including the first one
    pub max_attempts: usize,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1), // 1 second
            max_delay: Duration::from_secs(30), // 30 seconds
            max_attempts: 3,
        }
    }
}

impl BackoffConfig {
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: usize) -> Self {
        Self { base_delay, max_delay, max_attempts }
    }
}

/// Tracks failed attempts for one retried operation
#[derive(Debug, Clone)]
pub struct BackoffState {
    config: BackoffConfig,
    retry_count: usize,
}

impl BackoffState {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, retry_count: 0 }
    }

    /// Delay to wait before the next attempt, based on the failures recorded so far
    pub fn next_delay(&self) -> Duration {
        let exponent = (self.retry_count.saturating_sub(1) as u32).min(MAX_EXPONENT);
        let delay = self.config.base_delay.saturating_mul(2_u32.saturating_pow(exponent));
        delay.min(self.config.max_delay)
    }

    /// Record a failed attempt and return the number of failures so far
    pub fn increment_retry(&mut self) -> usize {
        self.retry_count += 1;
        self.retry_count
    }

    pub fn get_retry_count(&self) -> usize {
        self.retry_count
    }

    /// True once every configured attempt has failed
    pub fn is_exhausted(&self) -> bool {
        self.retry_count >= self.config.max_attempts
    }

    pub fn reset(&mut self) {
        self.retry_count = 0;
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }
}

/// Runs `operation` until it succeeds or `config.max_attempts` attempts have failed.
///
/// The closure receives the 1-based attempt number. No delay follows the last
/// attempt; its error is returned as is.
pub async fn retry_with_backoff<T, E, F, Fut>(config: BackoffConfig, label: &str, mut operation: F) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut state = BackoffState::new(config);
    loop {
        let attempt = state.get_retry_count() + 1;
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                state.increment_retry();
                if state.is_exhausted() {
                    return Err(err);
                }
                let delay = state.next_delay();
                warn!(
                    operation = label,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_default_config() {
        let config = BackoffConfig::default();
        assert_eq!(config.base_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert_eq!(config.max_attempts, 3);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(3, 4)]
    #[case(5, 16)]
    #[case(6, 30)]
    #[case(200, 30)]
    fn test_delay_doubles_and_caps(#[case] failures: usize, #[case] expected_secs: u64) {
        let mut state = BackoffState::new(BackoffConfig::default());
        for _ in 0..failures {
            state.increment_retry();
        }
        assert_eq!(state.next_delay(), Duration::from_secs(expected_secs));
    }

    #[test]
    fn test_exhaustion_and_reset() {
        let mut state = BackoffState::new(BackoffConfig { max_attempts: 2, ..Default::default() });
        assert!(!state.is_exhausted());
        assert_eq!(state.increment_retry(), 1);
        assert!(!state.is_exhausted());
        assert_eq!(state.increment_retry(), 2);
        assert!(state.is_exhausted());

        state.reset();
        assert_eq!(state.get_retry_count(), 0);
        assert!(!state.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_stops_after_max_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let started = tokio::time::Instant::now();

        let result: Result<(), String> = retry_with_backoff(BackoffConfig::default(), "always_fails", |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("boom".to_string())
            }
        })
        .await;

        assert_eq!(result, Err("boom".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s + 2s between the three attempts, nothing after the last one
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_returns_first_success() {
        let result: Result<usize, String> = retry_with_backoff(BackoffConfig::default(), "flaky", |attempt| async move {
            if attempt < 2 {
                Err(format!("attempt {attempt} failed"))
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert_eq!(result, Ok(2));
    }
}
