use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::Address;
use chrono::{NaiveDate, Utc};
use tracing::{debug, error, info, warn, Instrument};

use crate::core::client::alert::{notify, AlertClient};
use crate::core::client::eligibility::{EligibilityError, EligibilitySource};
use crate::core::client::storage::{CacheSnapshot, RunStateStore, SnapshotStore};
use crate::types::{AlertEvent, ConfirmedBatch, HaltReason, RunFailure, RunOutcome, RunStage, RunSummary, RunTrigger};
use crate::worker::breaker::CircuitBreaker;
use crate::worker::submitter::EligibilitySubmitter;

/// Executes a single oracle run: breaker check, data acquisition, submission.
///
/// Every run ends in exactly one of success, failure or halt. A failure is
/// recorded in the breaker log once, before `run_once` returns. A failure that
/// cannot be recorded becomes a halt.
pub struct RunOrchestrator {
    breaker: Arc<CircuitBreaker>,
    source: Arc<dyn EligibilitySource>,
    snapshots: Arc<dyn SnapshotStore>,
    submitter: Arc<dyn EligibilitySubmitter>,
    run_state: Arc<dyn RunStateStore>,
    alerts: Arc<dyn AlertClient>,
    cache_max_age: Duration,
}

impl RunOrchestrator {
    pub fn new(
        breaker: Arc<CircuitBreaker>,
        source: Arc<dyn EligibilitySource>,
        snapshots: Arc<dyn SnapshotStore>,
        submitter: Arc<dyn EligibilitySubmitter>,
        run_state: Arc<dyn RunStateStore>,
        alerts: Arc<dyn AlertClient>,
        cache_max_age: Duration,
    ) -> Self {
        Self { breaker, source, snapshots, submitter, run_state, alerts, cache_max_age }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub async fn run_once(&self, run_date: NaiveDate, trigger: RunTrigger) -> RunOutcome {
        let span = tracing::info_span!("run", run_date = %run_date, trigger = %trigger);
        self.execute(run_date, trigger).instrument(span).await
    }

    async fn execute(&self, run_date: NaiveDate, trigger: RunTrigger) -> RunOutcome {
        let started = Instant::now();
        info!(log_type = "starting", category = "run", "Oracle run started");

        if let Err(reason) = self.breaker.check(Utc::now()).await {
            notify(self.alerts.as_ref(), AlertEvent::RunHalted { reason: reason.clone() }).await;
            return RunOutcome::Halted(reason);
        }

        let (indexers, cache_hit) = match self.acquire_indexers(run_date).await {
            Ok(acquired) => acquired,
            Err(e) => {
                return self.fail(run_date, trigger, RunStage::DataAcquisition, e.to_string(), Vec::new(), started).await
            }
        };

        match self.submitter.submit_all(&indexers).await {
            Ok(report) => {
                if let Err(e) = self.run_state.record_success(run_date).await {
                    error!(error = %e, "Failed to persist last successful run date");
                }
                let duration = started.elapsed();
                info!(
                    log_type = "completed",
                    category = "run",
                    eligible = report.total_addresses,
                    batches = report.batches.len(),
                    cache_hit,
                    duration_ms = duration.as_millis() as u64,
                    "Oracle run succeeded"
                );
                notify(
                    self.alerts.as_ref(),
                    AlertEvent::RunSucceeded {
                        run_date,
                        trigger,
                        eligible: report.total_addresses,
                        batches: report.batches.clone(),
                        duration,
                    },
                )
                .await;
                RunOutcome::Succeeded(RunSummary { run_date, trigger, report, duration, cache_hit })
            }
            Err(e) => {
                let error = e.to_string();
                self.fail(run_date, trigger, RunStage::Submission, error, e.confirmed, started).await
            }
        }
    }

    /// Fresh cached snapshot for `run_date`, or a new fetch that refreshes the cache.
    /// Cache problems never fail the run.
    async fn acquire_indexers(&self, run_date: NaiveDate) -> Result<(Vec<Address>, bool), EligibilityError> {
        match self.snapshots.load(run_date).await {
            Ok(Some(snapshot)) if snapshot.is_fresh(Utc::now(), self.cache_max_age) => {
                info!(
                    log_type = "cache",
                    category = "hit",
                    indexers = snapshot.indexers.len(),
                    fetched_at = %snapshot.fetched_at,
                    "Using cached eligibility snapshot"
                );
                return Ok((snapshot.indexers, true));
            }
            Ok(Some(snapshot)) => {
                debug!(fetched_at = %snapshot.fetched_at, "Cached eligibility snapshot is stale");
            }
            Ok(None) => debug!("No cached eligibility snapshot"),
            Err(e) => warn!(error = %e, "Ignoring unreadable eligibility snapshot"),
        }

        let indexers = self.source.fetch_eligible_indexers(run_date).await?;
        info!(log_type = "data", category = "fetched", indexers = indexers.len(), "Fetched eligible indexers");

        let snapshot = CacheSnapshot::new(run_date, Utc::now(), indexers);
        if let Err(e) = self.snapshots.save(&snapshot).await {
            warn!(error = %e, "Failed to cache eligibility snapshot");
        } else {
            match self.snapshots.prune(run_date).await {
                Ok(0) => {}
                Ok(removed) => info!(log_type = "cache", category = "prune", removed, "Removed expired eligibility snapshots"),
                Err(e) => warn!(error = %e, "Failed to prune expired eligibility snapshots"),
            }
        }
        Ok((snapshot.indexers, false))
    }

    async fn fail(
        &self,
        run_date: NaiveDate,
        trigger: RunTrigger,
        stage: RunStage,
        error: String,
        confirmed: Vec<ConfirmedBatch>,
        started: Instant,
    ) -> RunOutcome {
        let duration = started.elapsed();
        error!(
            log_type = "failed",
            category = "run",
            stage = %stage,
            confirmed_batches = confirmed.len(),
            error = %error,
            "Oracle run failed"
        );

        if let Err(e) = self.breaker.record_failure(Utc::now()).await {
            error!(
                log_type = "breaker",
                category = "record_failure",
                error = %e,
                "Failed to record run failure, halting instead of retrying"
            );
            let reason = HaltReason::FailureLogUnwritable(format!("{e}; run error: {error}"));
            notify(self.alerts.as_ref(), AlertEvent::RunHalted { reason: reason.clone() }).await;
            return RunOutcome::Halted(reason);
        }

        notify(
            self.alerts.as_ref(),
            AlertEvent::RunFailed {
                run_date,
                trigger,
                stage,
                error: error.clone(),
                confirmed: confirmed.clone(),
                duration,
            },
        )
        .await;

        RunOutcome::Failed(RunFailure { run_date, trigger, stage, error, confirmed, duration })
    }
}
