use clap::Args;

/// Parameters used to configure the circuit breaker.
#[derive(Debug, Clone, Args)]
pub struct BreakerCliArgs {
    /// Number of failed runs inside the window that stops any further run.
    #[arg(env = "ORACLE_MAX_FAILURES", long, default_value = "3")]
    pub max_failures: usize,

    /// Sliding window, in minutes, in which failures are counted.
    #[arg(env = "ORACLE_FAILURE_WINDOW_MINUTES", long, default_value = "60")]
    pub failure_window_minutes: u64,
}
