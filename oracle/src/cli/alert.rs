use clap::Args;
use url::Url;

/// Parameters used to configure Slack alerts.
#[derive(Clone, Args)]
pub struct AlertCliArgs {
    /// Slack incoming webhook. Without it alerts are only written to the log.
    #[arg(env = "ORACLE_SLACK_WEBHOOK_URL", long, hide_env_values = true)]
    pub slack_webhook_url: Option<Url>,

    /// Delivery attempts per alert before giving up.
    #[arg(env = "ORACLE_ALERT_DELIVERY_ATTEMPTS", long, default_value = "8")]
    pub alert_delivery_attempts: usize,
}

impl std::fmt::Debug for AlertCliArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertCliArgs")
            .field("slack_webhook_url", &self.slack_webhook_url.as_ref().map(|_| "<redacted>"))
            .field("alert_delivery_attempts", &self.alert_delivery_attempts)
            .finish()
    }
}
