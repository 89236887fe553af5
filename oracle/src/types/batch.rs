use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// An ordered slice of the eligible set, submitted as one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 0-based position of the batch inside the run
    pub index: usize,
    pub addresses: Vec<Address>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Splits `addresses` into consecutive batches of at most `batch_size` entries.
///
/// Every address lands in exactly one batch, in input order. Only the last batch
/// may be shorter than `batch_size`. A zero `batch_size` is treated as one.
pub fn partition_batches(addresses: &[Address], batch_size: usize) -> Vec<Batch> {
    addresses
        .chunks(batch_size.max(1))
        .enumerate()
        .map(|(index, chunk)| Batch { index, addresses: chunk.to_vec() })
        .collect()
}

/// A batch whose transaction was mined with a successful status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedBatch {
    pub index: usize,
    pub size: usize,
    pub nonce: u64,
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub explorer_url: Option<String>,
}

impl ConfirmedBatch {
    /// Explorer link when one is configured, the bare hash otherwise
    pub fn display_link(&self) -> String {
        self.explorer_url.clone().unwrap_or_else(|| format!("{:#x}", self.tx_hash))
    }
}

/// Result of a fully successful submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReport {
    pub batches: Vec<ConfirmedBatch>,
    pub total_addresses: usize,
}

impl SubmissionReport {
    pub fn tx_hashes(&self) -> Vec<B256> {
        self.batches.iter().map(|batch| batch.tx_hash).collect()
    }
}
