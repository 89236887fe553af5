use std::fmt;
use std::process::ExitCode;
use std::time::Duration;

use chrono::NaiveDate;

use crate::types::batch::{ConfirmedBatch, SubmissionReport};

/// Stages of a single run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    BreakerCheck,
    DataAcquisition,
    Submission,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStage::BreakerCheck => write!(f, "Circuit Breaker Check"),
            RunStage::DataAcquisition => write!(f, "Data Acquisition"),
            RunStage::Submission => write!(f, "Blockchain Submission"),
        }
    }
}

/// What caused a run to start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTrigger {
    Scheduled,
    Startup,
    CatchUp,
    Retry,
    Manual,
}

impl fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunTrigger::Scheduled => write!(f, "scheduled"),
            RunTrigger::Startup => write!(f, "startup"),
            RunTrigger::CatchUp => write!(f, "catch-up"),
            RunTrigger::Retry => write!(f, "retry"),
            RunTrigger::Manual => write!(f, "manual"),
        }
    }
}

/// Why the breaker refused to let a run start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    CircuitOpen { recent_failures: usize, max_failures: usize, window: Duration },
    /// The failure log could not be read or parsed
    UnreadableFailureLog(String),
    /// A failed run could not be recorded, so the breaker can no longer count it
    FailureLogUnwritable(String),
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::CircuitOpen { recent_failures, max_failures, window } => write!(
                f,
                "{recent_failures} failures in the last {} minutes (limit {max_failures})",
                window.as_secs() / 60
            ),
            HaltReason::UnreadableFailureLog(detail) => write!(f, "failure log unreadable: {detail}"),
            HaltReason::FailureLogUnwritable(detail) => write!(f, "failed run could not be recorded: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_date: NaiveDate,
    pub trigger: RunTrigger,
    pub report: SubmissionReport,
    pub duration: Duration,
    /// True when the eligible set came from a fresh cached snapshot
    pub cache_hit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    pub run_date: NaiveDate,
    pub trigger: RunTrigger,
    pub stage: RunStage,
    pub error: String,
    /// Batches confirmed on-chain before the failure
    pub confirmed: Vec<ConfirmedBatch>,
    pub duration: Duration,
}

/// Terminal state of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded(RunSummary),
    Failed(RunFailure),
    Halted(HaltReason),
}

impl RunOutcome {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            RunOutcome::Succeeded(_) => ExitStatus::Success,
            RunOutcome::Failed(_) => ExitStatus::RetryableFailure,
            RunOutcome::Halted(_) => ExitStatus::Halted,
        }
    }
}

/// How the process reports a finished run to its supervisor
///
/// A halt exits cleanly so that an on-failure restart policy leaves the process
/// down until an operator resets the breaker. Only a retryable failure asks for a
/// restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Halted,
    RetryableFailure,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success | ExitStatus::Halted => 0,
            ExitStatus::RetryableFailure => 1,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}
