//! Storage module for persisting crawl progress
//!
//! This module handles everything that touches stable storage:
//! - The `scraped`/`failed` dedup sets, rewritten whole at every checkpoint
//! - One file per recipe record, named after the record identifier
//! - Loading both back when a crawl resumes

mod directory;
mod filename;
mod traits;

pub use directory::{DirectoryStore, FAILED_FILE, RECIPES_DIR, SCRAPED_FILE};
pub use filename::{record_file_name, record_id_from_file_name};
pub use traits::{CheckpointStore, StorageError, StorageResult};

use std::collections::HashSet;
use std::path::Path;

/// Initializes or opens a directory store
///
/// # Arguments
///
/// * `path` - Root directory for checkpoint files and records
///
/// # Returns
///
/// * `Ok(DirectoryStore)` - Successfully opened store
/// * `Err(StorageError)` - The directory tree could not be created
pub fn open_storage(path: &Path) -> StorageResult<DirectoryStore> {
    DirectoryStore::new(path)
}

/// The persisted dedup state of a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoint {
    /// Canonical share URLs of every extracted recipe
    pub scraped: HashSet<String>,
    /// Dispatched page URLs that permanently failed
    pub failed: HashSet<String>,
}

impl Checkpoint {
    pub fn is_empty(&self) -> bool {
        self.scraped.is_empty() && self.failed.is_empty()
    }
}
