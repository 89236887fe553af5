use tracing::warn;

/// Keeps nonces strictly increasing across the batches of one run.
///
/// A lagging provider may report a pending count that ignores the transaction we
/// just confirmed, so the next nonce is `max(chain, previous + 1)`.
#[derive(Debug, Default)]
pub struct NonceTracker {
    last_used: Option<u64>,
}

impl NonceTracker {
    pub fn next(&mut self, chain_nonce: u64) -> u64 {
        let nonce = match self.last_used {
            Some(last) if chain_nonce <= last => {
                warn!(chain_nonce, last_used = last, "Provider reported a stale nonce, using the local sequence");
                last + 1
            }
            _ => chain_nonce,
        };
        self.last_used = Some(nonce);
        nonce
    }

    pub fn last_used(&self) -> Option<u64> {
        self.last_used
    }
}
