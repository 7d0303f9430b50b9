//! Storage traits and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::recipe::RecipeRecord;
use crate::storage::Checkpoint;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize record {id}: {source}")]
    Serialization {
        id: String,
        source: serde_json::Error,
    },

    #[error("Failed to replace {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for checkpoint backends
///
/// The dedup sets are always written whole; recipe records are written once
/// per identifier and only ever replaced with equivalent content.
/// Implementations must tolerate calls from several threads at once.
pub trait CheckpointStore: Send + Sync {
    /// Loads the persisted `scraped`/`failed` sets (empty when none exist yet)
    fn load_checkpoint(&self) -> StorageResult<Checkpoint>;

    /// Replaces the persisted sets with `checkpoint`
    fn save_checkpoint(&self, checkpoint: &Checkpoint) -> StorageResult<()>;

    /// Persists one recipe record, returning where it was written
    fn save_record(&self, record: &RecipeRecord) -> StorageResult<PathBuf>;

    /// Counts the persisted recipe records
    fn count_records(&self) -> StorageResult<usize>;
}
