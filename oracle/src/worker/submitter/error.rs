use std::time::Duration;

use alloy::primitives::B256;
use thiserror::Error;

use crate::core::signer::SignerError;
use crate::types::ConfirmedBatch;
use crate::worker::failover::FailoverError;

/// Why a single batch did not confirm
#[derive(Error, Debug)]
pub enum BatchFailure {
    #[error(transparent)]
    Rpc(#[from] FailoverError),

    #[error(transparent)]
    Signing(#[from] SignerError),

    #[error("No receipt for transaction {tx_hash:#x} within {timeout:?}")]
    ReceiptTimeout { tx_hash: B256, timeout: Duration },

    #[error("Transaction {tx_hash:#x} reverted in block {block_number:?}")]
    Reverted { tx_hash: B256, block_number: Option<u64> },
}

/// A run's submission stopped at `failed_batch`.
///
/// Batches before it stay confirmed on chain and are listed in `confirmed`; no
/// later batch was attempted.
#[derive(Error, Debug)]
#[error(
    "Batch {batch} of {total_batches} failed with {confirmed_count} batch(es) already confirmed: {cause}",
    batch = .failed_batch + 1,
    confirmed_count = .confirmed.len()
)]
pub struct SubmissionError {
    /// 0-based index of the failing batch
    pub failed_batch: usize,
    pub total_batches: usize,
    pub confirmed: Vec<ConfirmedBatch>,
    #[source]
    pub cause: BatchFailure,
}

impl SubmissionError {
    pub fn tx_hashes(&self) -> Vec<B256> {
        self.confirmed.iter().map(|batch| batch.tx_hash).collect()
    }
}
