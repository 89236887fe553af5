use clap::Args;
use std::path::PathBuf;

use crate::types::constant::DEFAULT_CACHE_RETENTION_DAYS;

/// Parameters used to locate the oracle's persisted state.
#[derive(Debug, Clone, Args)]
pub struct StorageCliArgs {
    /// Directory holding the failure log, the last-run marker, cached snapshots and the lock file.
    #[arg(env = "ORACLE_DATA_DIR", long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Days a cached eligibility snapshot is kept, counted back from the run date.
    #[arg(env = "ORACLE_CACHE_RETENTION_DAYS", long, default_value_t = DEFAULT_CACHE_RETENTION_DAYS)]
    pub cache_retention_days: u32,
}
