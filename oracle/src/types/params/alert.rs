use std::time::Duration;

use oracle_resilience::BackoffConfig;
use url::Url;

use crate::cli::alert::AlertCliArgs;

#[derive(Clone)]
pub struct AlertParams {
    pub slack_webhook_url: Option<Url>,
    pub delivery_attempts: usize,
}

impl AlertParams {
    pub fn delivery_backoff(&self) -> BackoffConfig {
        BackoffConfig::new(Duration::from_secs(1), Duration::from_secs(30), self.delivery_attempts.max(1))
    }
}

impl std::fmt::Debug for AlertParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertParams")
            .field("slack_webhook_url", &self.slack_webhook_url.as_ref().map(|_| "<redacted>"))
            .field("delivery_attempts", &self.delivery_attempts)
            .finish()
    }
}

impl From<AlertCliArgs> for AlertParams {
    fn from(args: AlertCliArgs) -> Self {
        Self { slack_webhook_url: args.slack_webhook_url, delivery_attempts: args.alert_delivery_attempts }
    }
}
