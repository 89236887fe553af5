pub mod alert;
pub mod breaker;
pub mod chain;
pub mod data;
pub mod schedule;
pub mod storage;
pub mod submission;

pub use alert::AlertParams;
pub use breaker::BreakerParams;
pub use chain::ChainParams;
pub use data::DataParams;
pub use schedule::ScheduleParams;
pub use storage::StorageParams;
pub use submission::SubmissionParams;

use std::time::Duration;

use crate::OracleError;

/// `value` minutes as a `Duration`, rejecting values that overflow when converted to seconds
pub(crate) fn minutes(value: u64, name: &str) -> Result<Duration, OracleError> {
    value
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| OracleError::ConfigError(format!("{name} of {value} minutes is out of range")))
}
