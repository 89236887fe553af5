use std::path::PathBuf;

use thiserror::Error;

use crate::core::client::storage::StorageError;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("Lock file IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist lock metadata: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to encode lock metadata: {0}")]
    Encode(#[from] serde_json::Error),
}
