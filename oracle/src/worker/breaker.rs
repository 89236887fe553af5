use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};

use crate::core::client::storage::{FailureStore, StorageError};
use crate::types::params::BreakerParams;
use crate::types::HaltReason;

/// Decides, before any expensive work, whether a run may start.
///
/// Open once `max_failures` failures were recorded in the trailing window. The
/// breaker is never closed by a successful run and has no half-open state:
/// only the window sliding past old failures, or an operator reset, closes it.
/// An unreadable failure log keeps it open.
pub struct CircuitBreaker {
    store: Arc<dyn FailureStore>,
    params: BreakerParams,
}

impl CircuitBreaker {
    pub fn new(store: Arc<dyn FailureStore>, params: BreakerParams) -> Self {
        Self { store, params }
    }

    pub fn params(&self) -> BreakerParams {
        self.params
    }

    fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let window = Duration::from_std(self.params.window).unwrap_or(Duration::MAX);
        now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Failures recorded inside the window ending at `now`
    pub async fn recent_failures(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        self.store.count_since(self.window_start(now)).await
    }

    /// `Ok(())` when execution is allowed, the halt reason otherwise. Has no side effects.
    pub async fn check(&self, now: DateTime<Utc>) -> Result<(), HaltReason> {
        let recent_failures = match self.recent_failures(now).await {
            Ok(count) => count,
            Err(e) => {
                error!(
                    log_type = "breaker",
                    category = "failure_log",
                    error = %e,
                    "Failure log unreadable, refusing to run"
                );
                return Err(HaltReason::UnreadableFailureLog(e.to_string()));
            }
        };

        if recent_failures >= self.params.max_failures {
            error!(
                log_type = "breaker",
                category = "open",
                recent_failures,
                max_failures = self.params.max_failures,
                window_minutes = self.params.window.as_secs() / 60,
                "CIRCUIT BREAKER OPEN: too many failed runs, halting until manual reset"
            );
            return Err(HaltReason::CircuitOpen {
                recent_failures,
                max_failures: self.params.max_failures,
                window: self.params.window,
            });
        }

        info!(
            log_type = "breaker",
            category = "closed",
            recent_failures,
            max_failures = self.params.max_failures,
            "Circuit breaker closed, execution allowed"
        );
        Ok(())
    }

    /// Whether a run may start at `now`
    pub async fn should_allow_execution(&self, now: DateTime<Utc>) -> bool {
        self.check(now).await.is_ok()
    }

    /// Durably records a failed run before returning
    pub async fn record_failure(&self, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.store.append(now).await?;
        warn!(log_type = "breaker", category = "record_failure", at = %now, "Recorded failed run");
        Ok(())
    }

    /// Clears the failure log. Only exposed to operators.
    pub async fn reset(&self) -> Result<(), StorageError> {
        self.store.clear().await?;
        info!(log_type = "breaker", category = "reset", "Circuit breaker reset");
        Ok(())
    }
}
