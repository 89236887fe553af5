use std::path::PathBuf;

use crate::cli::storage::StorageCliArgs;
use crate::types::constant::{CACHE_DIR_NAME, FAILURE_LOG_FILE_NAME, LAST_RUN_FILE_NAME, LOCK_FILE_NAME};

/// Locations of every file the oracle persists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageParams {
    pub data_dir: PathBuf,
    pub cache_retention_days: u32,
}

impl StorageParams {
    pub fn failure_log_path(&self) -> PathBuf {
        self.data_dir.join(FAILURE_LOG_FILE_NAME)
    }

    pub fn last_run_path(&self) -> PathBuf {
        self.data_dir.join(LAST_RUN_FILE_NAME)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join(CACHE_DIR_NAME)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join(LOCK_FILE_NAME)
    }
}

impl From<StorageCliArgs> for StorageParams {
    fn from(args: StorageCliArgs) -> Self {
        Self { data_dir: args.data_dir, cache_retention_days: args.cache_retention_days }
    }
}
