use crate::storage::Checkpoint;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Counters reset at every checkpoint, used for progress reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntervalCounts {
    pub scraped: u64,
    pub failed: u64,
    pub skipped: u64,
}

/// Counters accumulated over the whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Dispatches that went past the skip check
    pub processed: u64,
    /// Recipe records registered
    pub scraped: u64,
    /// Dispatches that ended as failures
    pub failed: u64,
    /// Dispatches skipped as already seen
    pub skipped: u64,
}

#[derive(Debug, Default)]
struct Inner {
    scraped: HashSet<String>,
    failed: HashSet<String>,
    interval: IntervalCounts,
    totals: RunTotals,
}

/// Deduplication state and counters shared by every in-flight dispatch
///
/// All reads and writes go through one mutex, held only for set lookups and
/// inserts. `scraped` holds canonical share URLs, `failed` holds dispatched
/// page URLs, and the two sets never overlap: a URL that has been scraped is
/// never added to `failed`, and a scrape promotes a URL out of `failed`.
#[derive(Debug, Default)]
pub struct CrawlState {
    inner: Mutex<Inner>,
}

impl CrawlState {
    /// Creates an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state seeded from a persisted checkpoint
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Self {
        let Checkpoint { scraped, mut failed } = checkpoint;
        failed.retain(|url| !scraped.contains(url));

        Self {
            inner: Mutex::new(Inner {
                scraped,
                failed,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Dispatch-time dedup check
    ///
    /// Returns true (and counts a skip) when the URL is already in `scraped`
    /// or `failed`.
    pub fn check_and_skip(&self, url: &str) -> bool {
        let mut inner = self.lock();
        if inner.scraped.contains(url) || inner.failed.contains(url) {
            inner.interval.skipped += 1;
            inner.totals.skipped += 1;
            true
        } else {
            false
        }
    }

    /// Registers the canonical URLs of records that were just persisted
    ///
    /// Counts one scrape per record, including records whose URL was
    /// already registered.
    ///
    /// A URL found in `failed` is moved out of it. This is the only removal
    /// from either set during a run: keeping the sets disjoint takes
    /// precedence over `failed` being append-only.
    pub fn record_scraped<I>(&self, canonical_urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut inner = self.lock();
        for url in canonical_urls {
            inner.failed.remove(&url);
            inner.scraped.insert(url);
            inner.interval.scraped += 1;
            inner.totals.scraped += 1;
        }
    }

    /// Registers a dispatched URL as failed
    pub fn record_failed(&self, url: &str) {
        let mut inner = self.lock();
        if !inner.scraped.contains(url) {
            inner.failed.insert(url.to_string());
        }
        inner.interval.failed += 1;
        inner.totals.failed += 1;
    }

    /// Counts a dispatch that went past the skip check
    pub fn record_processed(&self) {
        self.lock().totals.processed += 1;
    }

    /// Snapshots both sets and takes (resetting) the interval counters
    ///
    /// Done under a single lock acquisition so the counters and the
    /// snapshot describe the same moment.
    pub fn checkpoint(&self) -> (IntervalCounts, Checkpoint) {
        let mut inner = self.lock();
        let counts = std::mem::take(&mut inner.interval);
        let snapshot = Checkpoint {
            scraped: inner.scraped.clone(),
            failed: inner.failed.clone(),
        };
        (counts, snapshot)
    }

    pub fn totals(&self) -> RunTotals {
        self.lock().totals
    }

    pub fn contains_scraped(&self, url: &str) -> bool {
        self.lock().scraped.contains(url)
    }

    pub fn contains_failed(&self, url: &str) -> bool {
        self.lock().failed.contains(url)
    }

    pub fn scraped_len(&self) -> usize {
        self.lock().scraped.len()
    }

    pub fn failed_len(&self) -> usize {
        self.lock().failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn set(urls: &[&str]) -> HashSet<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_skip_known_urls() {
        let state = CrawlState::from_checkpoint(Checkpoint {
            scraped: set(&["https://x/a"]),
            failed: set(&["https://x/b"]),
        });

        assert!(state.check_and_skip("https://x/a"));
        assert!(state.check_and_skip("https://x/b"));
        assert!(!state.check_and_skip("https://x/c"));

        assert_eq!(state.totals().skipped, 2);
        let (counts, _) = state.checkpoint();
        assert_eq!(counts.skipped, 2);
    }

    #[test]
    fn test_record_scraped_counts_every_record() {
        let state = CrawlState::new();
        state.record_scraped(vec!["u/a".to_string(), "u/b".to_string(), "u/a".to_string()]);

        assert_eq!(state.scraped_len(), 2);
        assert_eq!(state.totals().scraped, 3);
    }

    #[test]
    fn test_failed_never_overlaps_scraped() {
        let state = CrawlState::new();
        state.record_scraped(vec!["u/a".to_string()]);
        state.record_failed("u/a");

        assert!(state.contains_scraped("u/a"));
        assert!(!state.contains_failed("u/a"));
        assert_eq!(state.totals().failed, 1);
    }

    #[test]
    fn test_scrape_promotes_out_of_failed() {
        let state = CrawlState::new();
        state.record_failed("u/a");
        state.record_scraped(vec!["u/a".to_string()]);

        assert!(state.contains_scraped("u/a"));
        assert!(!state.contains_failed("u/a"));
    }

    #[test]
    fn test_from_checkpoint_enforces_disjoint_sets() {
        let state = CrawlState::from_checkpoint(Checkpoint {
            scraped: set(&["u/a"]),
            failed: set(&["u/a", "u/b"]),
        });

        assert_eq!(state.scraped_len(), 1);
        assert_eq!(state.failed_len(), 1);
        assert!(state.contains_failed("u/b"));
    }

    #[test]
    fn test_checkpoint_resets_interval_counters_only() {
        let state = CrawlState::new();
        state.record_scraped(vec!["u/a".to_string()]);
        state.record_failed("p/b");
        state.record_processed();
        state.record_processed();

        let (counts, snapshot) = state.checkpoint();
        assert_eq!(
            counts,
            IntervalCounts {
                scraped: 1,
                failed: 1,
                skipped: 0
            }
        );
        assert_eq!(snapshot.scraped, set(&["u/a"]));
        assert_eq!(snapshot.failed, set(&["p/b"]));

        let (counts, snapshot) = state.checkpoint();
        assert_eq!(counts, IntervalCounts::default());
        assert_eq!(snapshot.scraped.len(), 1);

        let totals = state.totals();
        assert_eq!(totals.processed, 2);
        assert_eq!(totals.scraped, 1);
        assert_eq!(totals.failed, 1);
    }

    #[test]
    fn test_concurrent_registration_of_same_url() {
        let state = Arc::new(CrawlState::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        state.record_scraped(vec!["u/shared".to_string()]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(state.scraped_len(), 1);
        assert_eq!(state.totals().scraped, 800);
    }
}
