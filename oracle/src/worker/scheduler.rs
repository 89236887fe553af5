use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use oracle_resilience::BackoffState;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::client::alert::{notify, AlertClient};
use crate::core::client::lock::{LockClient, LockResult};
use crate::core::client::storage::RunStateStore;
use crate::error::{OracleError, OracleResult};
use crate::types::params::ScheduleParams;
use crate::types::{AlertEvent, ExitStatus, RunOutcome, RunTrigger};
use crate::worker::orchestrator::RunOrchestrator;

/// Gap between the last successful run and today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissedRuns {
    /// Last successful run, capped to the catch-up lookback
    pub last_run: NaiveDate,
    pub missed_days: i64,
    pub replay_date: NaiveDate,
}

/// Daily runs yield one missed day per date strictly between `last_run` and `today`.
/// Only yesterday is replayed.
pub fn missed_runs(last_run: Option<NaiveDate>, today: NaiveDate, catchup_max_days: u32) -> Option<MissedRuns> {
    let last_run = last_run?;
    let floor = today.checked_sub_days(Days::new(u64::from(catchup_max_days)))?;
    let yesterday = today.pred_opt()?;

    let last_run = if last_run < floor {
        warn!(%last_run, capped_to = %floor, "Last successful run is older than the catch-up lookback");
        floor
    } else {
        last_run
    };

    if last_run >= yesterday {
        return None;
    }

    Some(MissedRuns { last_run, missed_days: (today - last_run).num_days() - 1, replay_date: yesterday })
}

/// First occurrence of `run_time` (UTC) strictly after `now`
pub fn next_run_at(now: DateTime<Utc>, run_time: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(run_time).and_utc();
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Long running driver: startup catch-up, then one run per day at the configured time.
///
/// Failed runs are retried with exponential backoff until they succeed or the
/// circuit breaker halts the process.
pub struct Scheduler {
    orchestrator: Arc<RunOrchestrator>,
    run_state: Arc<dyn RunStateStore>,
    lock: Arc<dyn LockClient>,
    alerts: Arc<dyn AlertClient>,
    params: ScheduleParams,
    owner: String,
}

impl Scheduler {
    pub fn new(
        orchestrator: Arc<RunOrchestrator>,
        run_state: Arc<dyn RunStateStore>,
        lock: Arc<dyn LockClient>,
        alerts: Arc<dyn AlertClient>,
        params: ScheduleParams,
        owner: impl Into<String>,
    ) -> Self {
        Self { orchestrator, run_state, lock, alerts, params, owner: owner.into() }
    }

    /// Runs once under the instance lock
    pub async fn execute_run(&self, run_date: NaiveDate, trigger: RunTrigger) -> OracleResult<RunOutcome> {
        if let LockResult::AlreadyHeld(owner) = self.lock.acquire_lock(&self.owner, self.params.lock_ttl).await? {
            return Err(OracleError::InstanceLocked(owner));
        }

        let outcome = self.orchestrator.run_once(run_date, trigger).await;

        if let Err(e) = self.lock.release_lock(&self.owner).await {
            warn!(error = %e, "Failed to release run lock, it will expire on its own");
        }
        Ok(outcome)
    }

    /// Retries `run_date` until it succeeds, halts, or shutdown is requested
    pub async fn run_until_settled(
        &self,
        run_date: NaiveDate,
        trigger: RunTrigger,
        shutdown: &CancellationToken,
    ) -> OracleResult<RunOutcome> {
        let mut backoff = BackoffState::new(self.params.restart_backoff());
        let mut trigger = trigger;

        loop {
            let outcome = self.execute_run(run_date, trigger).await?;
            if !matches!(outcome, RunOutcome::Failed(_)) {
                return Ok(outcome);
            }

            backoff.increment_retry();
            let delay = backoff.next_delay();
            warn!(
                log_type = "scheduler",
                category = "retry",
                %run_date,
                attempt = backoff.get_retry_count(),
                delay_secs = delay.as_secs(),
                "Run failed, retrying after delay"
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.cancelled() => return Ok(outcome),
            }
            trigger = RunTrigger::Retry;
        }
    }

    async fn last_successful_run(&self) -> Option<NaiveDate> {
        match self.run_state.last_successful_run().await {
            Ok(last_run) => last_run,
            Err(e) => {
                error!(error = %e, "Last successful run record is unreadable, skipping catch-up");
                None
            }
        }
    }

    /// Startup run or catch-up of yesterday, if either is due
    pub async fn startup(&self, today: NaiveDate, shutdown: &CancellationToken) -> OracleResult<Option<RunOutcome>> {
        notify(
            self.alerts.as_ref(),
            AlertEvent::SchedulerStarted {
                scheduled_time: self.params.run_time,
                run_on_startup: self.params.run_on_startup,
            },
        )
        .await;

        if self.params.run_on_startup {
            info!(log_type = "scheduler", category = "startup", %today, "Running immediately on startup");
            return self.run_until_settled(today, RunTrigger::Startup, shutdown).await.map(Some);
        }

        let last_run = self.last_successful_run().await;
        let Some(missed) = missed_runs(last_run, today, self.params.catchup_max_days) else {
            info!(log_type = "scheduler", category = "startup", last_run = ?last_run, "No missed runs");
            return Ok(None);
        };

        warn!(
            log_type = "scheduler",
            category = "catch_up",
            last_run = %missed.last_run,
            missed_days = missed.missed_days,
            replay_date = %missed.replay_date,
            "Missed runs detected, replaying yesterday"
        );
        notify(
            self.alerts.as_ref(),
            AlertEvent::MissedRuns {
                last_run: missed.last_run,
                missed_days: missed.missed_days,
                replay_date: missed.replay_date,
            },
        )
        .await;

        self.run_until_settled(missed.replay_date, RunTrigger::CatchUp, shutdown).await.map(Some)
    }

    /// Drives runs until halted or cancelled
    pub async fn run(&self, shutdown: CancellationToken) -> OracleResult<ExitStatus> {
        if let Some(outcome) = self.startup(Utc::now().date_naive(), &shutdown).await? {
            if let Some(status) = settle(&outcome, &shutdown) {
                return Ok(self.stop(status, &shutdown).await);
            }
        }

        loop {
            let now = Utc::now();
            let next = next_run_at(now, self.params.run_time);
            info!(log_type = "scheduler", category = "wait", next_run = %next, "Waiting for next scheduled run");

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.cancelled() => return Ok(self.stop(ExitStatus::Success, &shutdown).await),
            }

            let outcome = self.run_until_settled(Utc::now().date_naive(), RunTrigger::Scheduled, &shutdown).await?;
            if let Some(status) = settle(&outcome, &shutdown) {
                return Ok(self.stop(status, &shutdown).await);
            }
        }
    }

    async fn stop(&self, status: ExitStatus, shutdown: &CancellationToken) -> ExitStatus {
        if shutdown.is_cancelled() {
            info!(log_type = "scheduler", category = "shutdown", exit_status = ?status, "Shutdown requested, scheduler stopping");
            notify(self.alerts.as_ref(), AlertEvent::SchedulerStopped).await;
        }
        status
    }
}

/// Exit status when `outcome` should stop the scheduler
fn settle(outcome: &RunOutcome, shutdown: &CancellationToken) -> Option<ExitStatus> {
    match outcome {
        RunOutcome::Halted(reason) => {
            error!(log_type = "scheduler", category = "halted", reason = %reason, "Scheduler halted");
            Some(ExitStatus::Halted)
        }
        RunOutcome::Failed(_) => Some(ExitStatus::RetryableFailure),
        RunOutcome::Succeeded(_) if shutdown.is_cancelled() => Some(ExitStatus::Success),
        RunOutcome::Succeeded(_) => None,
    }
}
