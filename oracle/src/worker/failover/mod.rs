pub mod error;
pub mod pool;

use std::future::Future;
use std::sync::Arc;

use oracle_resilience::{BackoffConfig, BackoffState};
use tracing::{debug, error, warn};

use crate::core::client::alert::{notify, AlertClient};
use crate::core::client::rpc::RpcCallError;
use crate::core::client::ChainRpc;
use crate::types::AlertEvent;
pub use error::FailoverError;
pub use pool::{ProviderCursor, ProviderPool, RpcProvider};

/// Runs chain operations against an ordered provider pool.
///
/// For every call the pool is walked from the primary provider. Each provider
/// gets `backoff.max_attempts` attempts with capped exponential backoff between
/// them. When a provider is exhausted a rotation alert is sent before moving to
/// the next one. Deterministic rejections are returned immediately.
pub struct FailoverRpcClient {
    pool: ProviderPool,
    backoff: BackoffConfig,
    alerts: Arc<dyn AlertClient>,
}

impl FailoverRpcClient {
    pub fn new(pool: ProviderPool, backoff: BackoffConfig, alerts: Arc<dyn AlertClient>) -> Self {
        Self { pool, backoff, alerts }
    }

    pub fn provider_count(&self) -> usize {
        self.pool.len()
    }

    /// Executes one logical operation, `call` being invoked once per attempt.
    pub async fn execute<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, FailoverError>
    where
        F: FnMut(Arc<dyn ChainRpc>) -> Fut + Send,
        Fut: Future<Output = Result<T, RpcCallError>> + Send,
        T: Send,
    {
        let mut cursor = ProviderCursor::start();
        let mut last_error = None;

        while let Some(provider) = self.pool.get(cursor) {
            let mut state = BackoffState::new(self.backoff);
            loop {
                let attempt = state.get_retry_count() + 1;
                match call(provider.client()).await {
                    Ok(value) => {
                        if attempt > 1 || cursor.position() > 0 {
                            debug!(operation, provider = %provider, attempt, "RPC call recovered");
                        }
                        return Ok(value);
                    }
                    Err(err) if !err.is_retryable() => {
                        error!(operation, provider = %provider, error = %err, "RPC call rejected");
                        return Err(FailoverError::Rejected { operation, provider: provider.to_string(), source: err });
                    }
                    Err(err) => {
                        state.increment_retry();
                        if state.is_exhausted() {
                            warn!(
                                operation,
                                provider = %provider,
                                attempts = attempt,
                                error = %err,
                                "RPC provider exhausted"
                            );
                            last_error = Some(err);
                            break;
                        }
                        let delay = state.next_delay();
                        warn!(
                            operation,
                            provider = %provider,
                            attempt,
                            max_attempts = self.backoff.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "RPC call failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }

            cursor = cursor.advance();
            if let Some(next) = self.pool.get(cursor) {
                let reason = last_error.as_ref().map(ToString::to_string).unwrap_or_default();
                warn!(operation, from = %provider, to = %next, "Rotating to next RPC provider");
                notify(
                    self.alerts.as_ref(),
                    AlertEvent::ProviderRotated {
                        operation: operation.to_string(),
                        from: provider.to_string(),
                        to: next.to_string(),
                        reason,
                    },
                )
                .await;
            }
        }

        let providers = self.pool.len();
        let attempts = providers * self.backoff.max_attempts;
        error!(operation, providers, attempts, "All RPC providers exhausted");
        Err(FailoverError::AllProvidersExhausted {
            operation,
            providers,
            attempts,
            last_error: last_error.unwrap_or(RpcCallError::Transport("no attempt was made".to_string())),
        })
    }
}
