use alloy::network::ReceiptResponse;
use alloy::primitives::{keccak256, Address, Bytes, B256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{ChainRpc, FeeEstimate, ReceiptSummary, RpcCallError};

/// JSON-RPC over HTTP against a single endpoint
pub struct EthereumRpcClient {
    provider: RootProvider<Http<Client>>,
}

impl EthereumRpcClient {
    pub fn new(rpc_url: Url) -> Self {
        Self { provider: ProviderBuilder::new().on_http(rpc_url) }
    }
}

#[async_trait]
impl ChainRpc for EthereumRpcClient {
    async fn transaction_count(&self, address: Address) -> Result<u64, RpcCallError> {
        Ok(self.provider.get_transaction_count(address).pending().await?)
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64, RpcCallError> {
        Ok(self.provider.estimate_gas(&request).await?)
    }

    async fn fee_estimate(&self) -> Result<FeeEstimate, RpcCallError> {
        let estimate = self.provider.estimate_eip1559_fees(None).await?;
        Ok(FeeEstimate {
            max_fee_per_gas: estimate.max_fee_per_gas,
            max_priority_fee_per_gas: estimate.max_priority_fee_per_gas,
        })
    }

    async fn send_raw_transaction(&self, payload: Bytes) -> Result<B256, RpcCallError> {
        match self.provider.send_raw_transaction(&payload).await {
            Ok(pending) => Ok(*pending.tx_hash()),
            Err(err) => {
                let err = RpcCallError::from(err);
                // A previous attempt reached the node even though its response got lost
                if err.is_already_known() {
                    let hash = keccak256(&payload);
                    debug!(tx_hash = %hash, "Transaction already known to the node");
                    return Ok(hash);
                }
                Err(err)
            }
        }
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, RpcCallError> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.map(|receipt| ReceiptSummary {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: ReceiptResponse::status(&receipt),
        }))
    }
}
