//! Storage abstractions for result persistence.
//!
//! A destination holds one persisted [`ResultSet`]: a flat JSON array of
//! records, or an object mapping a group value to an array.
//!
//! Writing into an occupied destination requires [`WriteMode::Append`], in
//! which case the stored set and the new one are merged
//! (see [`crate::pipeline::merge`]). Otherwise the write is refused with
//! [`AppError::Conflict`](crate::error::AppError::Conflict) before anything
//! touches disk.

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::ResultSet;

// Re-export for convenience
pub use local::LocalStorage;

/// How to treat a destination that already holds data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Fail if the destination exists
    #[default]
    Create,
    /// Merge into what is already stored
    Append,
}

/// Metadata about a storage write operation.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    pub key: String,
    /// Records in the destination after the write
    pub total_records: usize,
    /// Whether an existing set was merged
    pub merged: bool,
    pub timestamp: DateTime<Utc>,
}

/// Trait for result storage backends.
#[async_trait]
pub trait ResultStorage: Send + Sync {
    /// Whether `key` already holds data.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Load a persisted set, `None` if absent.
    ///
    /// Data that is not a record array or grouped object is a
    /// `MalformedData` error.
    async fn load(&self, key: &str) -> Result<Option<ResultSet>>;

    /// Persist `set` at `key` according to `mode`.
    async fn write(&self, key: &str, set: ResultSet, mode: WriteMode) -> Result<WriteMetadata>;
}
