pub mod csv;

use std::path::PathBuf;

use alloy::primitives::Address;
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

pub use self::csv::CsvEligibilitySource;

#[derive(Error, Debug)]
pub enum EligibilityError {
    #[error("Eligibility export not found at {0}")]
    NotFound(PathBuf),

    #[error("Failed to read eligibility export {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed eligibility export {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Produces the ordered eligible set for a run date
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EligibilitySource: Send + Sync {
    async fn fetch_eligible_indexers(&self, run_date: NaiveDate) -> Result<Vec<Address>, EligibilityError>;
}
