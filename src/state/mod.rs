//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the `scraped`/`failed` dedup sets and progress counters shared by all dispatches
//! - `DispatchOutcome`: the terminal outcome of dispatching one frontier URL
//! - `FailureReason` / `AbsenceReason`: why a dispatched URL was recorded as failed

mod crawl_state;
mod outcome;

// Re-export main types
pub use crawl_state::{CrawlState, IntervalCounts, RunTotals};
pub use outcome::{AbsenceReason, DispatchOutcome, FailureReason};
