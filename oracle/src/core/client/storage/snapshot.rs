use std::io::ErrorKind;
use std::path::PathBuf;

use alloy::primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use super::{atomic_write, read_optional, remove_if_exists, StorageError};
use crate::types::constant::LAST_RUN_DATE_FORMAT;

/// Eligible set computed for a run date, kept so that a retried run does not query the source again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub run_date: NaiveDate,
    pub fetched_at: DateTime<Utc>,
    pub indexers: Vec<Address>,
}

impl CacheSnapshot {
    pub fn new(run_date: NaiveDate, fetched_at: DateTime<Utc>, indexers: Vec<Address>) -> Self {
        Self { run_date, fetched_at, indexers }
    }

    /// Fresh while `now - fetched_at <= max_age`. A snapshot from the future is never fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: std::time::Duration) -> bool {
        match (now - self.fetched_at).to_std() {
            Ok(age) => age <= max_age,
            Err(_) => false,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self, run_date: NaiveDate) -> Result<Option<CacheSnapshot>, StorageError>;

    async fn save(&self, snapshot: &CacheSnapshot) -> Result<(), StorageError>;

    /// Deletes snapshots older than the retention period before `reference`.
    /// Returns how many were removed.
    async fn prune(&self, reference: NaiveDate) -> Result<usize, StorageError>;
}

/// One JSON file per run date
pub struct FileSnapshotStore {
    dir: PathBuf,
    /// `None` keeps every snapshot
    retention_days: Option<u32>,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), retention_days: None }
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = Some(days);
        self
    }

    fn path_for(&self, run_date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", run_date.format(LAST_RUN_DATE_FORMAT)))
    }
}

/// Run date encoded in a snapshot file name, `None` for anything else in the directory
fn snapshot_date(file_name: &str) -> Option<NaiveDate> {
    let stem = file_name.strip_suffix(".json")?;
    NaiveDate::parse_from_str(stem, LAST_RUN_DATE_FORMAT).ok()
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self, run_date: NaiveDate) -> Result<Option<CacheSnapshot>, StorageError> {
        let path = self.path_for(run_date);
        let Some(contents) = read_optional(&path).await? else {
            return Ok(None);
        };
        let snapshot = serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt {
            path: path.clone(),
            line: e.line(),
            reason: e.to_string(),
        })?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &CacheSnapshot) -> Result<(), StorageError> {
        let path = self.path_for(snapshot.run_date);
        let contents =
            serde_json::to_vec_pretty(snapshot).map_err(|source| StorageError::Serialization { path: path.clone(), source })?;
        atomic_write(&path, &contents).await
    }

    async fn prune(&self, reference: NaiveDate) -> Result<usize, StorageError> {
        let Some(retention_days) = self.retention_days else {
            return Ok(0);
        };

        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StorageError::io(&self.dir, e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await.map_err(|e| StorageError::io(&self.dir, e))? {
            let Some(run_date) = entry.file_name().to_str().and_then(snapshot_date) else {
                continue;
            };
            if (reference - run_date).num_days() > i64::from(retention_days) {
                remove_if_exists(&entry.path()).await?;
                debug!(%run_date, "Removed expired eligibility snapshot");
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use tempfile::tempdir;

    const MAX_AGE: std::time::Duration = std::time::Duration::from_secs(30 * 60);

    fn snapshot(fetched_at: DateTime<Utc>) -> CacheSnapshot {
        CacheSnapshot::new(
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            fetched_at,
            vec![Address::repeat_byte(0x11), Address::repeat_byte(0x22)],
        )
    }

    #[rstest]
    #[case(0, true)]
    #[case(29, true)]
    #[case(30, true)]
    #[case(31, false)]
    #[case(-5, false)]
    fn freshness(#[case] age_minutes: i64, #[case] fresh: bool) {
        let fetched_at = Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap();
        let now = fetched_at + Duration::minutes(age_minutes);
        assert_eq!(snapshot(fetched_at).is_fresh(now, MAX_AGE), fresh);
    }

    #[tokio::test]
    async fn saved_snapshot_loads_back() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let original = snapshot(Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap());

        store.save(&original).await.unwrap();

        assert_eq!(store.load(original.run_date).await.unwrap(), Some(original.clone()));
        assert_eq!(store.load(NaiveDate::from_ymd_opt(2025, 1, 3).unwrap()).await.unwrap(), None);
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    #[tokio::test]
    async fn prune_removes_only_expired_snapshots() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path()).with_retention_days(30);
        for run_date in [date(1, 1), date(3, 1), date(3, 31)] {
            store.save(&CacheSnapshot::new(run_date, Utc::now(), Vec::new())).await.unwrap();
        }
        std::fs::write(dir.path().join("notes.json"), "{}").unwrap();
        std::fs::write(dir.path().join("2024-01-01.txt"), "").unwrap();

        let removed = store.prune(date(3, 31)).await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.load(date(1, 1)).await.unwrap(), None);
        // exactly 30 days old is still kept
        assert!(store.load(date(3, 1)).await.unwrap().is_some());
        assert!(store.load(date(3, 31)).await.unwrap().is_some());
        assert!(dir.path().join("notes.json").exists());
        assert!(dir.path().join("2024-01-01.txt").exists());
    }

    #[tokio::test]
    async fn prune_without_retention_keeps_everything() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        store.save(&CacheSnapshot::new(date(1, 1), Utc::now(), Vec::new())).await.unwrap();

        assert_eq!(store.prune(date(12, 31)).await.unwrap(), 0);
        assert!(store.load(date(1, 1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn prune_of_a_missing_directory_is_a_no_op() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("cache")).with_retention_days(1);

        assert_eq!(store.prune(date(1, 1)).await.unwrap(), 0);
    }
}
