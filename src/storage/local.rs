//! Local filesystem storage implementation.
//!
//! Keys are paths relative to the storage root; absolute keys are used
//! as-is. Every write goes to a temporary sibling first and is renamed into
//! place, so a failed run never leaves a truncated file behind.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::ResultSet;
use crate::pipeline::merge::merge;
use crate::storage::{ResultStorage, WriteMetadata, WriteMode};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data, pretty-printed.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl ResultStorage for LocalStorage {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path(key)).await?)
    }

    async fn load(&self, key: &str) -> Result<Option<ResultSet>> {
        match self.read_bytes(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| AppError::malformed(key, e)),
            None => Ok(None),
        }
    }

    async fn write(&self, key: &str, set: ResultSet, mode: WriteMode) -> Result<WriteMetadata> {
        let existing = match mode {
            WriteMode::Create => {
                if self.exists(key).await? {
                    return Err(AppError::Conflict(key.to_string()));
                }
                None
            }
            WriteMode::Append => self.load(key).await?,
        };

        let merged = existing.is_some();
        let set = match existing {
            Some(existing) => merge(existing, set)?,
            None => set,
        };

        self.write_json(key, &set).await?;
        log::info!("Saved {} records to {}", set.len(), self.path(key).display());

        Ok(WriteMetadata {
            key: key.to_string(),
            total_records: set.len(),
            merged,
            timestamp: Utc::now(),
        })
    }
}
