pub mod error;
pub mod ethereum;

use alloy::primitives::{Address, Bytes, B256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

pub use error::RpcCallError;
pub use ethereum::EthereumRpcClient;

/// EIP-1559 fee caps in wei
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimate {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// The parts of a transaction receipt the oracle acts upon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
}

/// One RPC endpoint. Every call is a single attempt; retries and rotation live in the failover client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Pending transaction count of `address`, i.e. the next usable nonce
    async fn transaction_count(&self, address: Address) -> Result<u64, RpcCallError>;

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64, RpcCallError>;

    async fn fee_estimate(&self) -> Result<FeeEstimate, RpcCallError>;

    /// Broadcasts an EIP-2718 encoded transaction and returns its hash
    async fn send_raw_transaction(&self, payload: Bytes) -> Result<B256, RpcCallError>;

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, RpcCallError>;
}
