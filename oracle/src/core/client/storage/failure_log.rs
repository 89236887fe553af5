use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{atomic_write, read_optional, remove_if_exists, StorageError};

/// Durable, append-only record of failed runs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FailureStore: Send + Sync {
    /// Persists a failure timestamp before returning.
    async fn append(&self, at: DateTime<Utc>) -> Result<(), StorageError>;

    /// Number of recorded failures at or after `since`.
    async fn count_since(&self, since: DateTime<Utc>) -> Result<usize, StorageError>;

    /// Forgets every recorded failure. Operator action only.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// One RFC 3339 timestamp per line, rewritten atomically on every append.
///
/// Entries older than `retention` relative to the newest append are dropped
/// during the rewrite. Lines without an offset are read as UTC.
pub struct FileFailureStore {
    path: PathBuf,
    retention: Duration,
    write_lock: Mutex<()>,
}

impl FileFailureStore {
    pub fn new(path: impl Into<PathBuf>, retention: std::time::Duration) -> Self {
        let retention = Duration::from_std(retention).unwrap_or(Duration::MAX);
        Self { path: path.into(), retention, write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_records(&self) -> Result<Vec<DateTime<Utc>>, StorageError> {
        let Some(contents) = read_optional(&self.path).await? else {
            return Ok(Vec::new());
        };

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                parse_timestamp(line.trim()).ok_or_else(|| StorageError::Corrupt {
                    path: self.path.clone(),
                    line: index + 1,
                    reason: format!("not a timestamp: {:?}", line),
                })
            })
            .collect()
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok().map(|naive| naive.and_utc())
}

#[async_trait]
impl FailureStore for FileFailureStore {
    async fn append(&self, at: DateTime<Utc>) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        let at = match records.last() {
            Some(last) if *last > at => {
                warn!(recorded = %at, latest = %last, "Failure timestamp earlier than the latest entry, clamping");
                *last
            }
            _ => at,
        };

        let cutoff = at.checked_sub_signed(self.retention).unwrap_or(DateTime::<Utc>::MIN_UTC);
        records.retain(|ts| *ts >= cutoff);
        records.push(at);

        let mut contents = String::new();
        for ts in &records {
            contents.push_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true));
            contents.push('\n');
        }
        atomic_write(&self.path, contents.as_bytes()).await?;

        debug!(path = %self.path.display(), retained = records.len(), "Recorded run failure");
        Ok(())
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<usize, StorageError> {
        Ok(self.read_records().await?.into_iter().filter(|ts| *ts >= since).count())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        remove_if_exists(&self.path).await
    }
}
