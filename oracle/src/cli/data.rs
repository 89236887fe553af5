use clap::Args;
use std::path::PathBuf;

/// Parameters used to acquire the eligible indexer set.
#[derive(Debug, Clone, Args)]
pub struct DataCliArgs {
    /// Directory with one `YYYY-MM-DD/eligible_indexers.csv` per run date, written by the eligibility pipeline.
    #[arg(env = "ORACLE_ELIGIBILITY_DIR", long, default_value = "data/output")]
    pub eligibility_dir: PathBuf,

    /// Max age of a cached snapshot that can be reused instead of reloading, in minutes.
    #[arg(env = "ORACLE_CACHE_MAX_AGE_MINUTES", long, default_value = "30")]
    pub cache_max_age_minutes: u64,
}
