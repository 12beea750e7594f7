use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::persistence::slot_store::{SlotStore, StoreError};

const SLOT_EXTENSION: &str = "json";

/// One file per slot inside a directory, with a byte quota over all slot files.
///
/// Writes go to a temp file in the same directory and are renamed into place, so a
/// failed write never truncates the previous copy. Blocking I/O runs on the blocking pool.
pub struct FileStore {
    dir: PathBuf,
    quota_bytes: u64,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>, quota_bytes: u64) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, quota_bytes })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_stem}.{SLOT_EXTENSION}"))
    }
}

/// Total size of slot files in `dir`, skipping `exclude`.
fn slot_usage(dir: &Path, exclude: &Path) -> std::io::Result<u64> {
    let mut total = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_slot = path.extension().is_some_and(|ext| ext == SLOT_EXTENSION);
        if is_slot && path != exclude {
            total += std::fs::metadata(&path)?.len();
        }
    }
    Ok(total)
}

fn write_bounded(dir: &Path, path: &Path, value: &str, quota_bytes: u64) -> Result<(), StoreError> {
    let used_elsewhere = slot_usage(dir, path)?;
    let requested = value.len() as u64;
    if used_elsewhere + requested > quota_bytes {
        return Err(StoreError::QuotaExceeded {
            requested: value.len(),
            available: quota_bytes.saturating_sub(used_elsewhere) as usize,
        });
    }

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(value.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl SlotStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let dir = self.dir.clone();
        let path = self.path_for(key);
        let value = value.to_string();
        let quota = self.quota_bytes;
        debug!("Writing {} bytes to {}", value.len(), path.display());

        tokio::task::spawn_blocking(move || write_bounded(&dir, &path, &value, quota))
            .await
            .map_err(|e| StoreError::Backend(format!("spawn_blocking failed in file store: {e}")))?
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), 1024).unwrap();
        assert_eq!(store.get("cv-primary").await.unwrap(), None);
        store.set("cv-primary", "{\"a\":1}").await.unwrap();
        assert_eq!(
            store.get("cv-primary").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(dir.path().join("cv-primary.json").exists());
    }

    #[tokio::test]
    async fn test_file_store_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), 1024).unwrap();
        store.remove("nothing-here").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_quota_keeps_previous_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), 16).unwrap();
        store.set("slot", "previous").await.unwrap();
        let err = store
            .set("slot", "this value is far too long")
            .await
            .unwrap_err();
        assert!(err.is_quota());
        assert_eq!(store.get("slot").await.unwrap().as_deref(), Some("previous"));
    }

    #[tokio::test]
    async fn test_file_store_quota_counts_other_slots() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), 16).unwrap();
        store.set("a", "0123456789").await.unwrap();
        assert!(store.set("b", "0123456789").await.unwrap_err().is_quota());
        store.remove("a").await.unwrap();
        store.set("b", "0123456789").await.unwrap();
    }

    #[test]
    fn test_path_for_sanitizes_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), 1024).unwrap();
        let path = store.path_for("../escape/me");
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(path.file_name().unwrap(), "___escape_me.json");
    }
}
