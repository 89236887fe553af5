use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bytes, B256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use oracle_resilience::BackoffConfig;

use crate::core::client::alert::{AlertClient, AlertError};
use crate::core::client::rpc::{ChainRpc, FeeEstimate, ReceiptSummary, RpcCallError};
use crate::core::client::storage::FileFailureStore;
use crate::core::signer::TransactionSigner;
use crate::types::params::BreakerParams;
use crate::types::AlertEvent;
use crate::worker::breaker::CircuitBreaker;
use crate::worker::failover::{FailoverRpcClient, ProviderPool, RpcProvider};

pub const TEST_PRIVATE_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
pub const TEST_CHAIN_ID: u64 = 421614;

pub fn test_signer() -> Arc<TransactionSigner> {
    Arc::new(TransactionSigner::new(TEST_PRIVATE_KEY, TEST_CHAIN_ID).unwrap())
}

/// Distinct, non-zero addresses in a stable order
pub fn addresses(count: usize) -> Vec<Address> {
    (0..count).map(|i| Address::left_padding_from(&(i as u64 + 1).to_be_bytes())).collect()
}

/// Number of indexers ABI-encoded in a `(address[],bytes)` call with an empty payload
pub fn indexers_in_calldata(calldata: &Bytes) -> usize {
    (calldata.len() - 4 - 64 - 32 - 32) / 32
}

pub fn fast_backoff(max_attempts: usize) -> BackoffConfig {
    BackoffConfig::new(Duration::from_millis(10), Duration::from_millis(40), max_attempts)
}

pub fn failover(clients: Vec<Arc<dyn ChainRpc>>, backoff: BackoffConfig, alerts: Arc<dyn AlertClient>) -> FailoverRpcClient {
    let providers = clients
        .into_iter()
        .enumerate()
        .map(|(position, client)| RpcProvider::with_label(position, format!("rpc-{}", position + 1), client))
        .collect();
    FailoverRpcClient::new(ProviderPool::new(providers).unwrap(), backoff, alerts)
}

pub fn file_breaker(dir: &Path, params: BreakerParams) -> CircuitBreaker {
    let store = FileFailureStore::new(dir.join("circuit_breaker.log"), params.window);
    CircuitBreaker::new(Arc::new(store), params)
}

/// Keeps every alert it is given
#[derive(Default)]
pub struct RecordingAlertClient {
    events: Mutex<Vec<AlertEvent>>,
}

impl RecordingAlertClient {
    pub fn events(&self) -> Vec<AlertEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.events().iter().map(|event| event.title().to_string()).collect()
    }
}

#[async_trait]
impl AlertClient for RecordingAlertClient {
    async fn send_alert(&self, event: &AlertEvent) -> Result<(), AlertError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// In-memory chain answering like a healthy node, with knobs for the failure paths
#[derive(Default)]
pub struct ScriptedChain {
    /// Pending nonce reported for every query; never advances
    pub chain_nonce: u64,
    /// Index of the send call to reject with "insufficient funds"
    pub fail_send_at: Option<usize>,
    /// Index of the sent transaction whose receipt reports a revert
    pub revert_at: Option<usize>,
    /// Index of the send call that lands on chain but whose response is lost
    pub lose_response_at: Option<usize>,
    pub withhold_receipts: bool,
    pub estimate_inputs: Mutex<Vec<Bytes>>,
    pub sent: Mutex<Vec<B256>>,
    pub send_calls: AtomicUsize,
}

impl ScriptedChain {
    pub fn estimated_batch_sizes(&self) -> Vec<usize> {
        self.estimate_inputs.lock().unwrap().iter().map(indexers_in_calldata).collect()
    }

    pub fn send_attempts(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<B256> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainRpc for ScriptedChain {
    async fn transaction_count(&self, _address: Address) -> Result<u64, RpcCallError> {
        Ok(self.chain_nonce)
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64, RpcCallError> {
        let input = request.input.input().cloned().unwrap_or_default();
        self.estimate_inputs.lock().unwrap().push(input);
        Ok(100_000)
    }

    async fn fee_estimate(&self) -> Result<FeeEstimate, RpcCallError> {
        Ok(FeeEstimate { max_fee_per_gas: 2_000_000_000, max_priority_fee_per_gas: 1_000_000_000 })
    }

    async fn send_raw_transaction(&self, payload: Bytes) -> Result<B256, RpcCallError> {
        let call = self.send_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_send_at == Some(call) {
            return Err(RpcCallError::Node {
                code: -32000,
                message: "insufficient funds for gas * price + value".to_string(),
            });
        }
        let hash = keccak256(&payload);
        let mut sent = self.sent.lock().unwrap();
        if sent.contains(&hash) {
            return Err(RpcCallError::Node { code: -32000, message: "nonce too low".to_string() });
        }
        sent.push(hash);
        if self.lose_response_at == Some(call) {
            return Err(RpcCallError::Transport("connection reset by peer".to_string()));
        }
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, RpcCallError> {
        if self.withhold_receipts {
            return Ok(None);
        }
        let sent = self.sent.lock().unwrap();
        let Some(index) = sent.iter().position(|h| *h == hash) else {
            return Ok(None);
        };
        Ok(Some(ReceiptSummary {
            transaction_hash: hash,
            block_number: Some(1_000 + index as u64),
            success: self.revert_at != Some(index),
        }))
    }
}
