pub const FAILURE_LOG_FILE_NAME: &str = "circuit_breaker.log";
pub const LAST_RUN_FILE_NAME: &str = "last_run.txt";
pub const CACHE_DIR_NAME: &str = "cache";
pub const LOCK_FILE_NAME: &str = "oracle.lock";
/// Cached snapshots older than this many days before the run date are deleted
pub const DEFAULT_CACHE_RETENTION_DAYS: u32 = 90;

pub const ELIGIBLE_INDEXERS_FILE_NAME: &str = "eligible_indexers.csv";
pub const INDEXER_COLUMN: &str = "indexer";

pub const LAST_RUN_DATE_FORMAT: &str = "%Y-%m-%d";

/// ABI parameter list of the eligibility renewal call: the indexer batch and an opaque payload
pub const ELIGIBILITY_CALL_PARAMS: &str = "(address[],bytes)";

pub const ALERT_FOOTER: &str = "Service Quality Oracle";
/// Slack truncates long attachment fields, keep error bodies well under the limit
pub const MAX_ALERT_ERROR_LENGTH: usize = 1000;

/// Upper bound on how long a shutdown waits for the run in progress
pub const SHUTDOWN_TIMEOUT_SECONDS: u64 = 300;
