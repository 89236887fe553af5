use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};

use crate::types::batch::ConfirmedBatch;
use crate::types::constant::MAX_ALERT_ERROR_LENGTH;
use crate::types::run::{HaltReason, RunStage, RunTrigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Success,
    Info,
    Failure,
}

/// Everything the oracle reports to operators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertEvent {
    RunSucceeded {
        run_date: NaiveDate,
        trigger: RunTrigger,
        eligible: usize,
        batches: Vec<ConfirmedBatch>,
        duration: Duration,
    },
    RunFailed {
        run_date: NaiveDate,
        trigger: RunTrigger,
        stage: RunStage,
        error: String,
        confirmed: Vec<ConfirmedBatch>,
        duration: Duration,
    },
    RunHalted {
        reason: HaltReason,
    },
    ProviderRotated {
        operation: String,
        from: String,
        to: String,
        reason: String,
    },
    MissedRuns {
        last_run: NaiveDate,
        missed_days: i64,
        replay_date: NaiveDate,
    },
    SchedulerStarted {
        scheduled_time: NaiveTime,
        run_on_startup: bool,
    },
    /// The scheduler stopped on a shutdown signal
    SchedulerStopped,
}

impl AlertEvent {
    pub fn severity(&self) -> AlertSeverity {
        match self {
            AlertEvent::RunSucceeded { .. } => AlertSeverity::Success,
            AlertEvent::RunFailed { .. } | AlertEvent::RunHalted { .. } => AlertSeverity::Failure,
            AlertEvent::ProviderRotated { .. }
            | AlertEvent::MissedRuns { .. }
            | AlertEvent::SchedulerStarted { .. }
            | AlertEvent::SchedulerStopped => AlertSeverity::Info,
        }
    }

    pub fn title(&self) -> String {
        match self {
            AlertEvent::RunSucceeded { .. } => "Service Quality Oracle - SUCCESS".to_string(),
            AlertEvent::RunFailed { .. } => "Service Quality Oracle - FAILURE, retry scheduled".to_string(),
            AlertEvent::RunHalted { .. } => "Service Quality Oracle - HALTED, manual reset required".to_string(),
            AlertEvent::ProviderRotated { .. } => "RPC Provider Rotation".to_string(),
            AlertEvent::MissedRuns { .. } => "Missed Runs Detected".to_string(),
            AlertEvent::SchedulerStarted { .. } => "Scheduler Started".to_string(),
            AlertEvent::SchedulerStopped => "Scheduler Stopped".to_string(),
        }
    }

    /// Ordered `(label, value)` pairs rendered by every alert client
    pub fn fields(&self) -> Vec<(String, String)> {
        match self {
            AlertEvent::RunSucceeded { run_date, trigger, eligible, batches, duration } => {
                let mut fields = vec![
                    field("Status", "Successfully completed"),
                    field("Run Date", run_date.to_string()),
                    field("Trigger", trigger.to_string()),
                    field("Eligible Indexers", eligible.to_string()),
                    field("Execution Time", format_duration(*duration)),
                    field("Transaction Batches", batches.len().to_string()),
                ];
                if !batches.is_empty() {
                    fields.push(field("Transactions", batch_links(batches)));
                }
                fields
            }
            AlertEvent::RunFailed { run_date, trigger, stage, error, confirmed, duration } => {
                let mut fields = vec![
                    field("Status", "Failed"),
                    field("Run Date", run_date.to_string()),
                    field("Trigger", trigger.to_string()),
                    field("Failed Stage", stage.to_string()),
                    field("Runtime", format_duration(*duration)),
                ];
                if !confirmed.is_empty() {
                    fields.push(field("Partial Transactions", batch_links(confirmed)));
                }
                fields.push(field("Error", format!("```{}```", truncate(error, MAX_ALERT_ERROR_LENGTH))));
                fields
            }
            AlertEvent::RunHalted { reason } => vec![
                field("Status", "Halted by circuit breaker"),
                field("Reason", reason.to_string()),
                field("Action", "Investigate, then run `reset-breaker` to resume"),
            ],
            AlertEvent::ProviderRotated { operation, from, to, reason } => vec![
                field("Operation", operation.clone()),
                field("From", from.clone()),
                field("To", to.clone()),
                field("Reason", truncate(reason, MAX_ALERT_ERROR_LENGTH)),
            ],
            AlertEvent::MissedRuns { last_run, missed_days, replay_date } => vec![
                field("Last Successful Run", last_run.to_string()),
                field("Missed Days", missed_days.to_string()),
                field("Catch-up Run Date", replay_date.to_string()),
            ],
            AlertEvent::SchedulerStarted { scheduled_time, run_on_startup } => vec![
                field("Scheduled Time (UTC)", scheduled_time.format("%H:%M").to_string()),
                field("Run On Startup", run_on_startup.to_string()),
            ],
            AlertEvent::SchedulerStopped => vec![field("Status", "Stopped by shutdown signal")],
        }
    }
}

fn field(label: &str, value: impl Into<String>) -> (String, String) {
    (label.to_string(), value.into())
}

fn batch_links(batches: &[ConfirmedBatch]) -> String {
    batches.iter().map(|batch| format!("Batch {}: {}", batch.index + 1, batch.display_link())).collect::<Vec<_>>().join("\n")
}

fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;

    fn confirmed(index: usize) -> ConfirmedBatch {
        ConfirmedBatch {
            index,
            size: 125,
            nonce: index as u64,
            tx_hash: B256::repeat_byte(index as u8 + 1),
            block_number: Some(100),
            explorer_url: Some(format!("https://arbiscan.io/tx/{index}")),
        }
    }

    #[test]
    fn failure_and_halt_are_distinguishable() {
        let failed = AlertEvent::RunFailed {
            run_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            trigger: RunTrigger::Scheduled,
            stage: RunStage::Submission,
            error: "boom".into(),
            confirmed: vec![],
            duration: Duration::from_secs(3),
        };
        let halted = AlertEvent::RunHalted {
            reason: HaltReason::CircuitOpen { recent_failures: 3, max_failures: 3, window: Duration::from_secs(3600) },
        };

        assert_eq!(failed.severity(), AlertSeverity::Failure);
        assert_eq!(halted.severity(), AlertSeverity::Failure);
        assert_ne!(failed.title(), halted.title());
        assert!(halted.title().contains("HALTED"));
    }

    #[test]
    fn failure_lists_partial_transactions_and_truncates_error() {
        let event = AlertEvent::RunFailed {
            run_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            trigger: RunTrigger::Retry,
            stage: RunStage::Submission,
            error: "x".repeat(MAX_ALERT_ERROR_LENGTH + 50),
            confirmed: vec![confirmed(0)],
            duration: Duration::from_secs(3),
        };

        let fields = event.fields();
        let partial = fields.iter().find(|(label, _)| label == "Partial Transactions").unwrap();
        assert_eq!(partial.1, "Batch 1: https://arbiscan.io/tx/0");

        let error = &fields.last().unwrap().1;
        assert!(error.len() < MAX_ALERT_ERROR_LENGTH + 20);
        assert!(error.ends_with("...```"));
    }

    #[test]
    fn success_lists_every_batch() {
        let event = AlertEvent::RunSucceeded {
            run_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            trigger: RunTrigger::Scheduled,
            eligible: 250,
            batches: vec![confirmed(0), confirmed(1)],
            duration: Duration::from_millis(1500),
        };

        let fields = event.fields();
        assert!(fields.contains(&("Transaction Batches".to_string(), "2".to_string())));
        assert!(fields.contains(&("Execution Time".to_string(), "1.5s".to_string())));
        let links = &fields.iter().find(|(label, _)| label == "Transactions").unwrap().1;
        assert_eq!(links.lines().count(), 2);
    }
}
