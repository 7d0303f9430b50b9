use chrono::{DateTime, Utc};

/// Summary of one crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Frontier URLs that went past the skip check
    pub processed: u64,

    /// Frontier URLs skipped as already seen
    pub skipped: u64,

    /// Dispatches that ended as failures during this run
    pub failed: u64,

    /// Recipe records written during this run
    pub records_written: u64,

    /// Size of the `scraped` set at the end of the run
    pub scraped_total: usize,

    /// Size of the `failed` set at the end of the run
    pub failed_total: usize,
}

impl CrawlSummary {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Prints the run summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Run:");
    println!("  Started:  {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  Duration: {}s", summary.duration_seconds());
    println!();

    println!("This run:");
    println!("  URLs processed: {}", summary.processed);
    println!("  URLs skipped: {}", summary.skipped);
    println!("  Dispatches failed: {}", summary.failed);
    println!("  Recipes written: {}", summary.records_written);
    println!();

    println!("Checkpoint:");
    println!("  Scraped URLs: {}", summary.scraped_total);
    println!("  Failed URLs: {}", summary.failed_total);
}
