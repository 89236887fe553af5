/// Backoff primitives for clients talking to unreliable external services.
///
/// The oracle retries in three places: individual RPC calls against one
/// provider, webhook deliveries, and whole runs after a failure. All of them
/// share the same shape: a bounded number of attempts separated by a delay that
/// starts at a base value, doubles after every failure and is capped.
///
/// # Example
///
/// ```rust,ignore
/// use oracle_resilience::{BackoffConfig, BackoffState};
///
/// let mut state = BackoffState::new(BackoffConfig::default());
/// loop {
///     match make_request().await {
///         Ok(result) => return Ok(result),
///         Err(e) => {
///             state.increment_retry();
///             if state.is_exhausted() {
///                 return Err(e);
///             }
///             tokio::time::sleep(state.next_delay()).await;
///         }
///     }
/// }
/// ```
pub mod retry;

pub use retry::{retry_with_backoff, BackoffConfig, BackoffState};
