use clap::Args;

/// Parameters used to configure the daily scheduler.
#[derive(Debug, Clone, Args)]
pub struct ScheduleCliArgs {
    /// Daily run time in UTC, formatted as HH:MM.
    #[arg(env = "ORACLE_SCHEDULED_RUN_TIME", long, default_value = "10:00")]
    pub scheduled_run_time: String,

    /// Run once immediately when the scheduler starts instead of checking for missed runs.
    #[arg(env = "ORACLE_RUN_ON_STARTUP", long, default_value = "false")]
    pub run_on_startup: bool,

    /// Oldest last-run date honoured when looking for missed runs, in days.
    #[arg(env = "ORACLE_CATCHUP_MAX_DAYS", long, default_value = "7")]
    pub catchup_max_days: u32,

    /// Delay before re-running a failed run, in seconds. Doubles on every consecutive failure.
    #[arg(env = "ORACLE_RESTART_DELAY_SECONDS", long, default_value = "60")]
    pub restart_delay_seconds: u64,

    /// Cap for the delay between consecutive failed runs, in seconds.
    #[arg(env = "ORACLE_RESTART_MAX_DELAY_SECONDS", long, default_value = "600")]
    pub restart_max_delay_seconds: u64,

    /// Expiry of the single-instance lock, in seconds.
    /// A lock left behind by a crashed process is taken over once expired.
    #[arg(env = "ORACLE_LOCK_TTL_SECONDS", long, default_value = "3600")]
    pub lock_ttl_seconds: u64,
}
