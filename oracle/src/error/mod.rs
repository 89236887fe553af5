use thiserror::Error;

use crate::core::client::alert::AlertError;
use crate::core::client::eligibility::EligibilityError;
use crate::core::client::lock::LockError;
use crate::core::client::rpc::RpcCallError;
use crate::core::client::storage::StorageError;
use crate::core::signer::SignerError;
use crate::worker::failover::FailoverError;
use crate::worker::submitter::SubmissionError;

/// Result type for oracle operations
pub type OracleResult<T> = Result<T, OracleError>;

/// Error types for the oracle
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Alert error: {0}")]
    AlertError(#[from] AlertError),

    #[error("Lock error: {0}")]
    LockError(#[from] LockError),

    #[error("RPC error: {0}")]
    RpcError(#[from] RpcCallError),

    #[error("Failover error: {0}")]
    FailoverError(#[from] FailoverError),

    #[error("Submission error: {0}")]
    SubmissionError(#[from] SubmissionError),

    #[error("Eligibility data error: {0}")]
    EligibilityError(#[from] EligibilityError),

    #[error("Signer error: {0}")]
    SignerError(#[from] SignerError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Another process holds the instance lock
    #[error("Another oracle instance is running: {0}")]
    InstanceLocked(String),

    #[error("Oracle Error: {0}")]
    OracleAnyHowError(#[from] anyhow::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
