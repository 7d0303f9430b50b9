//! Output module for progress reports and crawl summaries
//!
//! This module handles:
//! - Periodic progress lines written at every checkpoint
//! - The end-of-run summary
//! - Statistics over an existing output directory (`--stats`)

pub mod stats;
mod summary;

pub use stats::{load_statistics, print_statistics, StoreStatistics};
pub use summary::{print_summary, CrawlSummary};

use crate::state::IntervalCounts;
use std::fmt;

/// Activity since the previous checkpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressReport {
    /// Recipe records registered
    pub scraped: u64,

    /// Dispatches that ended as failures
    pub failed: u64,

    /// Dispatches skipped as already seen
    pub skipped: u64,
}

impl From<IntervalCounts> for ProgressReport {
    fn from(counts: IntervalCounts) -> Self {
        Self {
            scraped: counts.scraped,
            failed: counts.failed,
            skipped: counts.skipped,
        }
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Progress: scraped {}, failed {}, skipped {}",
            self.scraped, self.failed, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_report_display() {
        let report = ProgressReport::from(IntervalCounts {
            scraped: 12,
            failed: 3,
            skipped: 40,
        });

        assert_eq!(
            report.to_string(),
            "Progress: scraped 12, failed 3, skipped 40"
        );
    }
}
