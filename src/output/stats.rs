//! Statistics over an existing output directory
//!
//! This module provides functionality for summarizing what previous runs
//! left behind in the checkpoint store, without touching the network.

use crate::storage::{CheckpointStore, StorageResult};

/// Checkpoint store statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStatistics {
    /// URLs in the persisted `scraped` set
    pub scraped: usize,

    /// URLs in the persisted `failed` set
    pub failed: usize,

    /// Recipe record files on disk
    pub records: usize,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The checkpoint store to inspect
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to read the store
pub fn load_statistics(store: &dyn CheckpointStore) -> StorageResult<StoreStatistics> {
    let checkpoint = store.load_checkpoint()?;
    let records = store.count_records()?;

    Ok(StoreStatistics {
        scraped: checkpoint.scraped.len(),
        failed: checkpoint.failed.len(),
        records,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Checkpoint:");
    println!("  Scraped URLs: {}", stats.scraped);
    println!("  Failed URLs: {}", stats.failed);
    println!();

    println!("Recipes:");
    println!("  Record files: {}", stats.records);

    let attempted = stats.scraped + stats.failed;
    let success_rate = if attempted > 0 {
        (stats.scraped as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    println!();
    println!(
        "Success Rate: {:.1}% ({} / {} URLs scraped)",
        success_rate, stats.scraped, attempted
    );
}
