pub mod alert;
pub mod batch;
pub mod constant;
pub mod params;
pub mod run;

pub use alert::{AlertEvent, AlertSeverity};
pub use batch::{partition_batches, Batch, ConfirmedBatch, SubmissionReport};
pub use run::{ExitStatus, HaltReason, RunFailure, RunOutcome, RunStage, RunSummary, RunTrigger};
