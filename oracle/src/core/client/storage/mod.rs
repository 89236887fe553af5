pub mod failure_log;
pub mod run_state;
pub mod snapshot;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

pub use failure_log::{FailureStore, FileFailureStore};
pub use run_state::{FileRunStateStore, RunStateStore};
pub use snapshot::{CacheSnapshot, FileSnapshotStore, SnapshotStore};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt record in {path} at line {line}: {reason}")]
    Corrupt { path: PathBuf, line: usize, reason: String },

    #[error("Failed to serialize record for {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }
}

/// Reads a whole file, `None` when it does not exist
pub(crate) async fn read_optional(path: &Path) -> Result<Option<String>, StorageError> {
    match fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

/// Replaces `path` with `contents` so that readers observe either the old or the new file.
///
/// Writes a sibling temp file, fsyncs it, renames it over the target and fsyncs
/// the parent directory.
pub(crate) async fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent).await.map_err(|e| StorageError::io(parent, e))?;
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = File::create(&tmp_path).await.map_err(|e| StorageError::io(&tmp_path, e))?;
    file.write_all(contents).await.map_err(|e| StorageError::io(&tmp_path, e))?;
    file.sync_all().await.map_err(|e| StorageError::io(&tmp_path, e))?;
    drop(file);

    fs::rename(&tmp_path, path).await.map_err(|e| StorageError::io(path, e))?;

    #[cfg(unix)]
    if let Some(parent) = parent {
        let dir = File::open(parent).await.map_err(|e| StorageError::io(parent, e))?;
        dir.sync_all().await.map_err(|e| StorageError::io(parent, e))?;
    }

    Ok(())
}

/// Removes `path`, succeeding when it is already gone
pub(crate) async fn remove_if_exists(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn atomic_write_creates_parents_and_replaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.txt");

        atomic_write(&path, b"first").await.unwrap();
        atomic_write(&path, b"second").await.unwrap();

        assert_eq!(read_optional(&path).await.unwrap().as_deref(), Some("second"));
        assert!(!dir.path().join("nested").join("state.txt.tmp").exists());
    }

    #[tokio::test]
    async fn missing_files_read_as_none_and_remove_cleanly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent");

        assert!(read_optional(&path).await.unwrap().is_none());
        remove_if_exists(&path).await.unwrap();
    }
}
