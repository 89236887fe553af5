use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use super::{atomic_write, read_optional, StorageError};
use crate::types::constant::LAST_RUN_DATE_FORMAT;

/// Date of the last fully successful run
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RunStateStore: Send + Sync {
    async fn last_successful_run(&self) -> Result<Option<NaiveDate>, StorageError>;

    /// Persists `run_date` unless a later date is already recorded
    async fn record_success(&self, run_date: NaiveDate) -> Result<(), StorageError>;
}

/// Single `YYYY-MM-DD` line
pub struct FileRunStateStore {
    path: PathBuf,
}

impl FileRunStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RunStateStore for FileRunStateStore {
    async fn last_successful_run(&self) -> Result<Option<NaiveDate>, StorageError> {
        let Some(contents) = read_optional(&self.path).await? else {
            return Ok(None);
        };
        let value = contents.trim();
        if value.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(value, LAST_RUN_DATE_FORMAT).map(Some).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            line: 1,
            reason: format!("invalid date {:?}: {}", value, e),
        })
    }

    async fn record_success(&self, run_date: NaiveDate) -> Result<(), StorageError> {
        if let Ok(Some(previous)) = self.last_successful_run().await {
            if previous > run_date {
                info!(previous = %previous, run_date = %run_date, "Keeping later last-run date");
                return Ok(());
            }
        }
        let contents = format!("{}\n", run_date.format(LAST_RUN_DATE_FORMAT));
        atomic_write(&self.path, contents.as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[tokio::test]
    async fn round_trips_and_never_moves_backwards() {
        let dir = tempdir().unwrap();
        let store = FileRunStateStore::new(dir.path().join("last_run.txt"));

        assert_eq!(store.last_successful_run().await.unwrap(), None);

        store.record_success(date(10)).await.unwrap();
        store.record_success(date(9)).await.unwrap();
        assert_eq!(store.last_successful_run().await.unwrap(), Some(date(10)));

        store.record_success(date(11)).await.unwrap();
        assert_eq!(store.last_successful_run().await.unwrap(), Some(date(11)));
    }

    #[tokio::test]
    async fn garbage_is_reported_and_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("last_run.txt");
        std::fs::write(&path, "yesterday").unwrap();

        let store = FileRunStateStore::new(&path);
        assert_matches!(store.last_successful_run().await, Err(StorageError::Corrupt { .. }));

        store.record_success(date(3)).await.unwrap();
        assert_eq!(store.last_successful_run().await.unwrap(), Some(date(3)));
    }
}
