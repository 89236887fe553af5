use std::fmt;
use std::sync::Arc;

use url::Url;

use super::FailoverError;
use crate::core::client::ChainRpc;

/// One endpoint of the pool. Only the host is ever displayed since RPC URLs often embed API keys.
#[derive(Clone)]
pub struct RpcProvider {
    position: usize,
    label: String,
    client: Arc<dyn ChainRpc>,
}

impl RpcProvider {
    pub fn new(position: usize, url: &Url, client: Arc<dyn ChainRpc>) -> Self {
        Self { position, label: redact_url(url), client }
    }

    /// Provider with an explicit display label
    pub fn with_label(position: usize, label: impl Into<String>, client: Arc<dyn ChainRpc>) -> Self {
        Self { position, label: label.into(), client }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn client(&self) -> Arc<dyn ChainRpc> {
        self.client.clone()
    }
}

impl fmt::Debug for RpcProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcProvider").field("position", &self.position).field("label", &self.label).finish()
    }
}

impl fmt::Display for RpcProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.position + 1, self.label)
    }
}

/// Position in the provider pool for one logical operation.
///
/// The cursor only moves forward and never wraps: once it passes the last
/// provider the operation has exhausted the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProviderCursor(usize);

impl ProviderCursor {
    pub fn start() -> Self {
        Self(0)
    }

    pub fn position(self) -> usize {
        self.0
    }

    #[must_use]
    pub fn advance(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Ordered, non-empty list of providers; the first one is the primary
#[derive(Debug, Clone)]
pub struct ProviderPool {
    providers: Vec<RpcProvider>,
}

impl ProviderPool {
    pub fn new(providers: Vec<RpcProvider>) -> Result<Self, FailoverError> {
        if providers.is_empty() {
            return Err(FailoverError::EmptyPool);
        }
        Ok(Self { providers })
    }

    pub fn get(&self, cursor: ProviderCursor) -> Option<&RpcProvider> {
        self.providers.get(cursor.position())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// `scheme://host[:port]`, dropping path, query and credentials
pub fn redact_url(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}://{}:{}", url.scheme(), host, port),
        (Some(host), None) => format!("{}://{}", url.scheme(), host),
        _ => url.scheme().to_string(),
    }
}
