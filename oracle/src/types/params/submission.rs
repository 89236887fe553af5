use std::time::Duration;

use oracle_resilience::BackoffConfig;

use crate::cli::submission::SubmissionCliArgs;
use crate::OracleError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionParams {
    pub batch_size: usize,
    pub attempts_per_provider: usize,
    pub rpc_backoff_base: Duration,
    pub rpc_backoff_max: Duration,
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,
    pub gas_buffer_percent: u64,
}

impl SubmissionParams {
    /// Backoff applied to the attempts made against a single provider
    pub fn provider_backoff(&self) -> BackoffConfig {
        BackoffConfig::new(self.rpc_backoff_base, self.rpc_backoff_max, self.attempts_per_provider)
    }
}

impl Default for SubmissionParams {
    fn default() -> Self {
        Self {
            batch_size: 125,
            attempts_per_provider: 3,
            rpc_backoff_base: Duration::from_secs(1),
            rpc_backoff_max: Duration::from_secs(30),
            receipt_timeout: Duration::from_secs(30),
            receipt_poll_interval: Duration::from_secs(2),
            gas_buffer_percent: 25,
        }
    }
}

impl TryFrom<SubmissionCliArgs> for SubmissionParams {
    type Error = OracleError;

    fn try_from(args: SubmissionCliArgs) -> Result<Self, Self::Error> {
        if args.batch_size == 0 {
            return Err(OracleError::ConfigError("Batch size must be greater than zero".to_string()));
        }
        if args.attempts_per_provider == 0 {
            return Err(OracleError::ConfigError("Attempts per provider must be greater than zero".to_string()));
        }
        if args.receipt_timeout_seconds == 0 {
            return Err(OracleError::ConfigError("Receipt timeout must be greater than zero".to_string()));
        }

        Ok(Self {
            batch_size: args.batch_size,
            attempts_per_provider: args.attempts_per_provider,
            rpc_backoff_base: Duration::from_millis(args.rpc_backoff_base_ms),
            rpc_backoff_max: Duration::from_millis(args.rpc_backoff_max_ms.max(args.rpc_backoff_base_ms)),
            receipt_timeout: Duration::from_secs(args.receipt_timeout_seconds),
            receipt_poll_interval: Duration::from_millis(args.receipt_poll_interval_ms.max(1)),
            gas_buffer_percent: args.gas_buffer_percent,
        })
    }
}
