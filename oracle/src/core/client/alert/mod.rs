pub mod error;
pub mod log;
pub mod slack;

use async_trait::async_trait;
use tracing::warn;

use crate::types::AlertEvent;
pub use error::AlertError;
pub use log::LogAlertClient;
pub use slack::SlackAlertClient;

/// AlertClient trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertClient: Send + Sync {
    /// send_alert delivers one event to the operators.
    ///
    /// # Arguments
    ///
    /// * `event` - The event to report.
    async fn send_alert(&self, event: &AlertEvent) -> Result<(), AlertError>;
}

/// Sends an alert and swallows delivery failures.
///
/// Alerting is best effort: a broken webhook must never change the outcome of a
/// run, so failures are only logged.
pub async fn notify(alerts: &dyn AlertClient, event: AlertEvent) {
    if let Err(e) = alerts.send_alert(&event).await {
        warn!(
            log_type = "alert",
            category = "delivery",
            title = %event.title(),
            error = %e,
            "Failed to deliver alert"
        );
    }
}
