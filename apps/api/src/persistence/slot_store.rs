//! Key-value backend contract behind the CV persistence layer.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage quota exceeded: {requested} bytes requested, {available} available")]
    QuotaExceeded { requested: usize, available: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_quota(&self) -> bool {
        matches!(self, StoreError::QuotaExceeded { .. })
    }
}

/// The two persisted slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Written by an explicit save.
    Primary,
    /// Written by background auto-saves; first to be evicted under storage pressure.
    AutoSave,
}

impl Slot {
    pub fn name(&self) -> &'static str {
        match self {
            Slot::Primary => "primary",
            Slot::AutoSave => "autosave",
        }
    }

    pub fn key(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.name())
    }
}

/// A bounded string key-value store.
///
/// Implementations must report a write rejected for lack of space as
/// [`StoreError::QuotaExceeded`] and must leave the previous value intact when a write fails.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}
