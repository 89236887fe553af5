use thiserror::Error;

use crate::core::client::rpc::RpcCallError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailoverError {
    #[error("RPC provider pool is empty")]
    EmptyPool,

    /// Every provider used up its attempts for this operation
    #[error("All {providers} RPC providers exhausted for {operation} after {attempts} attempts, last error: {last_error}")]
    AllProvidersExhausted { operation: &'static str, providers: usize, attempts: usize, last_error: RpcCallError },

    /// Deterministic rejection, another provider would answer the same
    #[error("{operation} rejected by provider {provider}: {source}")]
    Rejected {
        operation: &'static str,
        provider: String,
        #[source]
        source: RpcCallError,
    },
}
