use alloy::transports::{RpcError, TransportErrorKind};
use thiserror::Error;

/// JSON-RPC error codes that signal a struggling node rather than a bad request
const TRANSIENT_NODE_CODES: &[i64] = &[
    -32603, // internal error
    -32005, // limit exceeded
    -32004, // method not supported on this node
    429,
];

/// Messages that every provider would answer the same way
const DETERMINISTIC_REJECTIONS: &[&str] = &[
    "execution reverted",
    "nonce too low",
    "insufficient funds",
    "replacement transaction underpriced",
    "intrinsic gas too low",
    "exceeds block gas limit",
    "invalid sender",
    "gas required exceeds allowance",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcCallError {
    /// The request never got a usable answer: connection, timeout, HTTP status, decoding
    #[error("Transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object
    #[error("Node returned error {code}: {message}")]
    Node { code: i64, message: String },

    /// The node answered with an empty result where one was required
    #[error("Empty response for {0}")]
    EmptyResponse(&'static str),
}

impl RpcCallError {
    /// Returns true if retrying, possibly on another provider, may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::EmptyResponse(_) => true,
            Self::Node { code, message } => {
                if TRANSIENT_NODE_CODES.contains(code) {
                    return true;
                }
                // Code 3 is the standard "execution reverted" error
                if *code == 3 {
                    return false;
                }
                let message = message.to_ascii_lowercase();
                !DETERMINISTIC_REJECTIONS.iter().any(|marker| message.contains(marker))
            }
        }
    }

    /// The node already holds this exact transaction in its pool
    pub fn is_already_known(&self) -> bool {
        matches!(self, Self::Node { message, .. } if message.to_ascii_lowercase().contains("already known"))
    }
}

impl From<RpcError<TransportErrorKind>> for RpcCallError {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        match err {
            RpcError::ErrorResp(payload) => Self::Node { code: payload.code, message: payload.message.to_string() },
            other => Self::Transport(other.to_string()),
        }
    }
}
