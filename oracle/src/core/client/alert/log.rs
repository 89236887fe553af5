use async_trait::async_trait;
use tracing::{error, info};

use super::{AlertClient, AlertError};
use crate::types::{AlertEvent, AlertSeverity};

/// Used when no webhook is configured: alerts only go to the log
#[derive(Debug, Default, Clone)]
pub struct LogAlertClient;

#[async_trait]
impl AlertClient for LogAlertClient {
    async fn send_alert(&self, event: &AlertEvent) -> Result<(), AlertError> {
        let body = event.fields().into_iter().map(|(label, value)| format!("{label}: {value}")).collect::<Vec<_>>().join(" | ");

        match event.severity() {
            AlertSeverity::Failure => error!(log_type = "alert", title = %event.title(), "{}", body),
            AlertSeverity::Success | AlertSeverity::Info => info!(log_type = "alert", title = %event.title(), "{}", body),
        }
        Ok(())
    }
}
