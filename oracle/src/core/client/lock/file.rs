use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{LockClient, LockError, LockInfo, LockResult};
use crate::core::client::storage::{atomic_write, read_optional, remove_if_exists};

/// Lock file created with `O_EXCL`. An expired or unreadable lock is taken over.
pub struct FileLockClient {
    path: PathBuf,
}

impl FileLockClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(path: &Path, source: std::io::Error) -> LockError {
        LockError::Io { path: path.to_path_buf(), source }
    }

    fn new_info(owner: &str, expiry: Duration) -> LockInfo {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(expiry).unwrap_or(chrono::Duration::MAX);
        LockInfo {
            owner: owner.to_string(),
            pid: std::process::id(),
            acquired_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(chrono::DateTime::<Utc>::MAX_UTC),
        }
    }

    async fn read_info(&self) -> Result<Option<Result<LockInfo, serde_json::Error>>, LockError> {
        Ok(read_optional(&self.path).await?.map(|contents| serde_json::from_str(&contents)))
    }

    async fn try_create(&self, info: &LockInfo) -> Result<bool, LockError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| Self::io_error(parent, e))?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(Self::io_error(&self.path, e)),
        };
        let contents = serde_json::to_vec(info)?;
        file.write_all(&contents).await.map_err(|e| Self::io_error(&self.path, e))?;
        file.sync_all().await.map_err(|e| Self::io_error(&self.path, e))?;
        Ok(true)
    }
}

#[async_trait]
impl LockClient for FileLockClient {
    async fn acquire_lock(&self, owner: &str, expiry: Duration) -> Result<LockResult, LockError> {
        // Second pass only happens after removing a stale lock
        for _ in 0..2 {
            let info = Self::new_info(owner, expiry);
            if self.try_create(&info).await? {
                debug!(path = %self.path.display(), owner = owner, "Lock acquired");
                return Ok(LockResult::Acquired);
            }

            match self.read_info().await? {
                // Removed between our create attempt and the read
                None => continue,
                Some(Ok(current)) if current.owner == owner => {
                    atomic_write(&self.path, &serde_json::to_vec(&info)?).await?;
                    return Ok(LockResult::Acquired);
                }
                Some(Ok(current)) if !current.is_expired(Utc::now()) => {
                    return Ok(LockResult::AlreadyHeld(current.owner));
                }
                Some(Ok(current)) => {
                    warn!(
                        path = %self.path.display(),
                        previous_owner = %current.owner,
                        expired_at = %current.expires_at,
                        "Taking over expired lock"
                    );
                }
                Some(Err(e)) => {
                    warn!(path = %self.path.display(), error = %e, "Taking over unreadable lock");
                }
            }
            remove_if_exists(&self.path).await?;
        }

        let holder = match self.read_info().await? {
            Some(Ok(current)) => current.owner,
            _ => "unknown".to_string(),
        };
        Ok(LockResult::AlreadyHeld(holder))
    }

    async fn release_lock(&self, owner: &str) -> Result<LockResult, LockError> {
        match self.read_info().await? {
            None => Ok(LockResult::NotFound),
            Some(Ok(current)) if current.owner != owner => Ok(LockResult::AlreadyHeld(current.owner)),
            Some(_) => {
                remove_if_exists(&self.path).await?;
                debug!(path = %self.path.display(), owner = owner, "Lock released");
                Ok(LockResult::Released)
            }
        }
    }

    async fn get_lock_owner(&self) -> Result<Option<LockInfo>, LockError> {
        Ok(self.read_info().await?.and_then(Result::ok))
    }
}
