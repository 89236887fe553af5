use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use oracle_resilience::{retry_with_backoff, BackoffConfig};
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use super::{AlertClient, AlertError};
use crate::types::constant::ALERT_FOOTER;
use crate::types::{AlertEvent, AlertSeverity};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SlackPayload {
    text: String,
    attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment {
    color: &'static str,
    fields: Vec<SlackField>,
    footer: &'static str,
    ts: i64,
}

#[derive(Debug, Serialize)]
struct SlackField {
    title: String,
    value: String,
    short: bool,
}

impl SlackPayload {
    fn from_event(event: &AlertEvent) -> Self {
        let color = match event.severity() {
            AlertSeverity::Success => "good",
            AlertSeverity::Failure => "danger",
            AlertSeverity::Info => "#439FE0",
        };
        let fields = event
            .fields()
            .into_iter()
            .map(|(title, value)| {
                // Multi-line values (transaction lists, errors) need the full attachment width
                let short = !value.contains('\n') && value.len() <= 40;
                SlackField { title, value, short }
            })
            .collect();

        Self {
            text: event.title(),
            attachments: vec![SlackAttachment { color, fields, footer: ALERT_FOOTER, ts: Utc::now().timestamp() }],
        }
    }
}

/// Delivers alerts to a Slack incoming webhook
pub struct SlackAlertClient {
    client: reqwest::Client,
    webhook_url: Url,
    backoff: BackoffConfig,
}

impl std::fmt::Debug for SlackAlertClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The webhook URL is a credential
        f.debug_struct("SlackAlertClient").field("backoff", &self.backoff).finish()
    }
}

impl SlackAlertClient {
    pub fn new(webhook_url: Url, backoff: BackoffConfig) -> Self {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_default();
        Self { client, webhook_url, backoff }
    }

    async fn post(&self, payload: &SlackPayload) -> Result<(), AlertError> {
        let response = self.client.post(self.webhook_url.clone()).json(payload).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(AlertError::Rejected { status: status.as_u16(), body })
    }
}

#[async_trait]
impl AlertClient for SlackAlertClient {
    async fn send_alert(&self, event: &AlertEvent) -> Result<(), AlertError> {
        let payload = SlackPayload::from_event(event);
        debug!(title = %payload.text, "Sending Slack alert");

        retry_with_backoff(self.backoff, "slack_alert", |_| self.post(&payload)).await?;

        info!(log_type = "alert", title = %payload.text, "Slack notification sent successfully");
        Ok(())
    }
}
