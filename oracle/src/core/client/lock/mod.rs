pub mod error;
pub mod file;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::LockError;
pub use file::FileLockClient;

/// Lock metadata stored alongside the lock, for operators inspecting a stuck instance
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LockInfo {
    pub owner: String,
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Result of lock acquisition attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockResult {
    Acquired,
    AlreadyHeld(String), // Contains current owner
    Released,
    NotFound,
}

/// Exclusive lock guaranteeing a single active run
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LockClient: Send + Sync {
    /// Acquire the lock unless another owner holds an unexpired one
    async fn acquire_lock(&self, owner: &str, expiry: Duration) -> Result<LockResult, LockError>;

    /// Release the lock if owned by `owner`
    async fn release_lock(&self, owner: &str) -> Result<LockResult, LockError>;

    /// Current holder, if any
    async fn get_lock_owner(&self) -> Result<Option<LockInfo>, LockError>;
}

/// Identifies this process as a lock owner
pub fn process_owner_id() -> String {
    format!("pid-{}-{}", std::process::id(), Utc::now().timestamp_millis())
}
