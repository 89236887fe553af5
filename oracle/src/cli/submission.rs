use clap::Args;

/// Parameters used to configure batching, retries and receipt waiting.
#[derive(Debug, Clone, Args)]
pub struct SubmissionCliArgs {
    /// Max number of indexer addresses per transaction.
    #[arg(env = "ORACLE_BATCH_SIZE", long, default_value = "125")]
    pub batch_size: usize,

    /// Attempts made against one RPC provider before rotating to the next one.
    #[arg(env = "ORACLE_ATTEMPTS_PER_PROVIDER", long, default_value = "3")]
    pub attempts_per_provider: usize,

    /// Delay before the first retry against the same provider, in milliseconds.
    /// Doubles after every failed attempt.
    #[arg(env = "ORACLE_RPC_BACKOFF_BASE_MS", long, default_value = "1000")]
    pub rpc_backoff_base_ms: u64,

    /// Cap for the per-provider retry delay, in milliseconds.
    #[arg(env = "ORACLE_RPC_BACKOFF_MAX_MS", long, default_value = "30000")]
    pub rpc_backoff_max_ms: u64,

    /// How long to wait for a batch receipt before failing the run, in seconds.
    #[arg(env = "ORACLE_RECEIPT_TIMEOUT_SECONDS", long, default_value = "30")]
    pub receipt_timeout_seconds: u64,

    /// Interval between receipt polls, in milliseconds.
    #[arg(env = "ORACLE_RECEIPT_POLL_INTERVAL_MS", long, default_value = "2000")]
    pub receipt_poll_interval_ms: u64,

    /// Extra gas added on top of the node's estimate, in percent.
    #[arg(env = "ORACLE_GAS_BUFFER_PERCENT", long, default_value = "25")]
    pub gas_buffer_percent: u64,
}
