use std::time::Duration;

use chrono::NaiveTime;
use oracle_resilience::BackoffConfig;

use crate::cli::schedule::ScheduleCliArgs;
use crate::OracleError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleParams {
    pub run_time: NaiveTime,
    pub run_on_startup: bool,
    pub catchup_max_days: u32,
    pub restart_delay: Duration,
    pub restart_max_delay: Duration,
    pub lock_ttl: Duration,
}

impl ScheduleParams {
    /// Delay between consecutive failed runs; the circuit breaker bounds how many happen
    pub fn restart_backoff(&self) -> BackoffConfig {
        BackoffConfig::new(self.restart_delay, self.restart_max_delay, usize::MAX)
    }
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            run_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            run_on_startup: false,
            catchup_max_days: 7,
            restart_delay: Duration::from_secs(60),
            restart_max_delay: Duration::from_secs(600),
            lock_ttl: Duration::from_secs(3600),
        }
    }
}

impl TryFrom<ScheduleCliArgs> for ScheduleParams {
    type Error = OracleError;

    fn try_from(args: ScheduleCliArgs) -> Result<Self, Self::Error> {
        let run_time = NaiveTime::parse_from_str(args.scheduled_run_time.trim(), "%H:%M").map_err(|e| {
            OracleError::ConfigError(format!(
                "Invalid scheduled run time {:?}, expected HH:MM: {}",
                args.scheduled_run_time, e
            ))
        })?;
        if args.catchup_max_days == 0 {
            return Err(OracleError::ConfigError("Catch-up lookback must be at least one day".to_string()));
        }

        Ok(Self {
            run_time,
            run_on_startup: args.run_on_startup,
            catchup_max_days: args.catchup_max_days,
            restart_delay: Duration::from_secs(args.restart_delay_seconds),
            restart_max_delay: Duration::from_secs(args.restart_max_delay_seconds.max(args.restart_delay_seconds)),
            lock_ttl: Duration::from_secs(args.lock_ttl_seconds.max(1)),
        })
    }
}
