pub mod calldata;
pub mod error;
pub mod nonce;

use std::sync::Arc;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, B256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tracing::{error, info, warn};
use url::Url;

use crate::core::client::rpc::ReceiptSummary;
use crate::core::signer::TransactionSigner;
use crate::types::params::SubmissionParams;
use crate::types::{partition_batches, Batch, ConfirmedBatch, SubmissionReport};
use crate::worker::failover::{FailoverError, FailoverRpcClient};
use calldata::{apply_gas_buffer, encode_eligibility_call};
pub use error::{BatchFailure, SubmissionError};
use nonce::NonceTracker;

/// Writes an eligible set to the chain
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EligibilitySubmitter: Send + Sync {
    /// Submits every indexer in order, one transaction per batch, waiting for each
    /// receipt before moving on. Stops at the first batch that does not confirm.
    async fn submit_all(&self, indexers: &[Address]) -> Result<SubmissionReport, SubmissionError>;
}

pub struct BatchSubmitter {
    rpc: Arc<FailoverRpcClient>,
    signer: Arc<TransactionSigner>,
    contract_address: Address,
    contract_function: String,
    params: SubmissionParams,
    block_explorer_url: Option<Url>,
}

impl BatchSubmitter {
    pub fn new(
        rpc: Arc<FailoverRpcClient>,
        signer: Arc<TransactionSigner>,
        contract_address: Address,
        contract_function: impl Into<String>,
        params: SubmissionParams,
    ) -> Self {
        Self {
            rpc,
            signer,
            contract_address,
            contract_function: contract_function.into(),
            params,
            block_explorer_url: None,
        }
    }

    pub fn with_block_explorer(mut self, url: Option<Url>) -> Self {
        self.block_explorer_url = url;
        self
    }

    fn explorer_link(&self, tx_hash: B256) -> Option<String> {
        self.block_explorer_url
            .as_ref()
            .map(|base| format!("{}/tx/{:#x}", base.as_str().trim_end_matches('/'), tx_hash))
    }

    async fn submit_batch(&self, batch: &Batch, nonces: &mut NonceTracker) -> Result<ConfirmedBatch, BatchFailure> {
        let from = self.signer.address();
        let calldata = encode_eligibility_call(&self.contract_function, &batch.addresses, &Bytes::new());
        let request = TransactionRequest::default().with_from(from).with_to(self.contract_address).with_input(calldata);

        let chain_nonce =
            self.rpc.execute("get_transaction_count", |rpc| async move { rpc.transaction_count(from).await }).await?;
        let nonce = nonces.next(chain_nonce);

        let estimate = self
            .rpc
            .execute("estimate_gas", |rpc| {
                let request = request.clone();
                async move { rpc.estimate_gas(request).await }
            })
            .await?;
        let gas_limit = apply_gas_buffer(estimate, self.params.gas_buffer_percent);

        let fees = self.rpc.execute("fee_estimate", |rpc| async move { rpc.fee_estimate().await }).await?;

        let signed = self
            .signer
            .sign(
                request
                    .with_nonce(nonce)
                    .with_gas_limit(gas_limit)
                    .with_max_fee_per_gas(fees.max_fee_per_gas)
                    .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas),
            )
            .await?;

        info!(
            log_type = "submission",
            category = "send",
            batch = batch.index + 1,
            nonce,
            gas_limit,
            tx_hash = %signed.hash,
            "Sending batch transaction"
        );

        let sent = self
            .rpc
            .execute("send_raw_transaction", |rpc| {
                let raw = signed.raw.clone();
                async move { rpc.send_raw_transaction(raw).await }
            })
            .await;
        match sent {
            Ok(tx_hash) if tx_hash != signed.hash => {
                warn!(expected = %signed.hash, returned = %tx_hash, "Provider returned an unexpected transaction hash");
            }
            Ok(_) => {}
            Err(send_error) => self.recover_lost_send(signed.hash, send_error).await?,
        }

        let receipt = self.wait_for_receipt(signed.hash).await?;
        if !receipt.success {
            return Err(BatchFailure::Reverted { tx_hash: signed.hash, block_number: receipt.block_number });
        }

        Ok(ConfirmedBatch {
            index: batch.index,
            size: batch.len(),
            nonce,
            tx_hash: signed.hash,
            block_number: receipt.block_number,
            explorer_url: self.explorer_link(signed.hash),
        })
    }

    /// A send whose response got lost may still have landed, in which case a retry
    /// is rejected with "nonce too low". The signed hash settles it.
    async fn recover_lost_send(&self, tx_hash: B256, send_error: FailoverError) -> Result<(), FailoverError> {
        let lookup = self
            .rpc
            .execute("get_transaction_receipt", |rpc| async move { rpc.transaction_receipt(tx_hash).await })
            .await;
        match lookup {
            Ok(Some(_)) => {
                warn!(
                    log_type = "submission",
                    category = "send_recovered",
                    tx_hash = %tx_hash,
                    error = %send_error,
                    "Send reported an error but the transaction is on chain"
                );
                Ok(())
            }
            Ok(None) => Err(send_error),
            Err(e) => {
                warn!(error = %e, "Receipt lookup after a failed send also failed");
                Err(send_error)
            }
        }
    }

    /// Polls for the receipt until it shows up or `receipt_timeout` elapses
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<ReceiptSummary, BatchFailure> {
        let poll = async {
            loop {
                let receipt = self
                    .rpc
                    .execute("get_transaction_receipt", |rpc| async move { rpc.transaction_receipt(tx_hash).await })
                    .await?;
                if let Some(receipt) = receipt {
                    return Ok::<_, FailoverError>(receipt);
                }
                tokio::time::sleep(self.params.receipt_poll_interval).await;
            }
        };

        match tokio::time::timeout(self.params.receipt_timeout, poll).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(BatchFailure::ReceiptTimeout { tx_hash, timeout: self.params.receipt_timeout }),
        }
    }
}

#[async_trait]
impl EligibilitySubmitter for BatchSubmitter {
    async fn submit_all(&self, indexers: &[Address]) -> Result<SubmissionReport, SubmissionError> {
        let batches = partition_batches(indexers, self.params.batch_size);
        if batches.is_empty() {
            info!(log_type = "submission", category = "skip", "No eligible indexers, nothing to submit");
            return Ok(SubmissionReport::default());
        }

        let total_batches = batches.len();
        info!(
            log_type = "submission",
            category = "start",
            indexers = indexers.len(),
            total_batches,
            batch_size = self.params.batch_size,
            signer = %self.signer.address(),
            "Submitting eligible indexers"
        );

        let mut nonces = NonceTracker::default();
        let mut confirmed = Vec::with_capacity(total_batches);

        for batch in &batches {
            match self.submit_batch(batch, &mut nonces).await {
                Ok(done) => {
                    info!(
                        log_type = "submission",
                        category = "confirmed",
                        batch = batch.index + 1,
                        total_batches,
                        size = done.size,
                        tx_hash = %done.tx_hash,
                        block_number = ?done.block_number,
                        "Batch confirmed"
                    );
                    confirmed.push(done);
                }
                Err(cause) => {
                    error!(
                        log_type = "submission",
                        category = "failed",
                        batch = batch.index + 1,
                        total_batches,
                        confirmed = confirmed.len(),
                        error = %cause,
                        "Batch failed, stopping submission"
                    );
                    return Err(SubmissionError { failed_batch: batch.index, total_batches, confirmed, cause });
                }
            }
        }

        Ok(SubmissionReport { batches: confirmed, total_addresses: indexers.len() })
    }
}
