//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates a run:
//! - Restoring the dedup state from the last checkpoint
//! - Walking the frontier under the admission gate
//! - Fetching, extracting, flattening and persisting each page
//! - Checkpointing on a wall-clock interval and once more at the end

use crate::config::Config;
use crate::crawler::extractor::{extract_state, ExtractError, Extracted};
use crate::crawler::fetcher::{fetch_page, FetchResult, RetryPolicy};
use crate::crawler::scheduler::{ScheduledFetch, Scheduler};
use crate::frontier::Frontier;
use crate::output::{CrawlSummary, ProgressReport};
use crate::recipe::{flatten, RecipeRecord};
use crate::session::Session;
use crate::state::{CrawlState, DispatchOutcome, FailureReason};
use crate::storage::CheckpointStore;
use crate::{LarderError, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

/// What a successfully fetched page turned out to hold
enum PageContent {
    Records(Vec<RecipeRecord>),
    Unusable(FailureReason),
    /// The access challenge page, with its title
    Challenge(String),
}

/// Everything one dispatch needs, cheap to clone into a task
#[derive(Clone)]
struct Dispatcher {
    session: Arc<dyn Session>,
    store: Arc<dyn CheckpointStore>,
    state: Arc<CrawlState>,
    policy: RetryPolicy,
    site_marker: Arc<str>,
}

impl Dispatcher {
    /// Processes one admitted URL
    ///
    /// Per-page problems end as `DispatchOutcome::Failed`; only an access
    /// challenge or a storage failure comes back as `Err`.
    async fn dispatch(&self, url: &str) -> Result<DispatchOutcome> {
        let body = match fetch_page(self.session.as_ref(), url, &self.policy).await {
            FetchResult::Content(body) => body,
            FetchResult::NotFound { status } => {
                return Ok(self.fail(url, FailureReason::NotFound { status }))
            }
            FetchResult::Exhausted {
                attempts,
                last_error,
            } => {
                return Ok(self.fail(
                    url,
                    FailureReason::RetriesExhausted {
                        attempts,
                        last_error,
                    },
                ))
            }
        };

        let site_marker = Arc::clone(&self.site_marker);
        let content =
            tokio::task::spawn_blocking(move || parse_page(&body, &site_marker)).await?;

        let records = match content {
            PageContent::Records(records) => records,
            PageContent::Unusable(reason) => return Ok(self.fail(url, reason)),
            PageContent::Challenge(title) => {
                return Err(LarderError::AccessChallenge {
                    url: url.to_string(),
                    title,
                })
            }
        };

        let store = Arc::clone(&self.store);
        let records = tokio::task::spawn_blocking(move || -> Result<Vec<RecipeRecord>> {
            for record in &records {
                store.save_record(record)?;
            }
            Ok(records)
        })
        .await??;

        let count = records.len();
        self.state
            .record_scraped(records.into_iter().map(|r| r.share_url().to_string()));
        tracing::debug!("Scraped {} ({} records)", url, count);

        Ok(DispatchOutcome::Succeeded { records: count })
    }

    fn fail(&self, url: &str, reason: FailureReason) -> DispatchOutcome {
        tracing::warn!("Failed {}: {}", url, reason);
        self.state.record_failed(url);
        DispatchOutcome::Failed(reason)
    }
}

/// Turns a fetched page into records; runs on the blocking pool
fn parse_page(html: &str, site_marker: &str) -> PageContent {
    let state = match extract_state(html, site_marker) {
        Ok(Extracted::Tree(state)) => state,
        Ok(Extracted::Absent(reason)) => {
            return PageContent::Unusable(FailureReason::Absent(reason))
        }
        Err(ExtractError::Malformed(detail)) => {
            return PageContent::Unusable(FailureReason::Malformed(detail))
        }
        Err(ExtractError::AccessChallenge { title }) => return PageContent::Challenge(title),
    };

    match flatten(&state) {
        Ok(records) if records.is_empty() => PageContent::Unusable(FailureReason::NoRecords),
        Ok(records) => PageContent::Records(records),
        Err(e) => PageContent::Unusable(FailureReason::Malformed(e.to_string())),
    }
}

/// Snapshots the crawl state, persists it and logs the interval's progress
fn write_checkpoint(state: &CrawlState, store: &dyn CheckpointStore) -> Result<ProgressReport> {
    let (counts, checkpoint) = state.checkpoint();
    store.save_checkpoint(&checkpoint)?;

    let report = ProgressReport::from(counts);
    tracing::info!("{}", report);
    Ok(report)
}

async fn checkpoint_loop(
    state: Arc<CrawlState>,
    store: Arc<dyn CheckpointStore>,
    period: Duration,
    mut stopped: watch::Receiver<bool>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = stopped.changed() => return Ok(()),
            _ = ticker.tick() => {
                let state = Arc::clone(&state);
                let store = Arc::clone(&store);
                tokio::task::spawn_blocking(move || write_checkpoint(&state, store.as_ref()))
                    .await??;
            }
        }
    }
}

/// Background task writing a checkpoint every interval until stopped
struct CheckpointTask {
    handle: Option<JoinHandle<Result<()>>>,
    stop: watch::Sender<bool>,
}

impl CheckpointTask {
    fn spawn(state: Arc<CrawlState>, store: Arc<dyn CheckpointStore>, period: Duration) -> Self {
        let (stop, stopped) = watch::channel(false);
        let handle = tokio::spawn(checkpoint_loop(state, store, period, stopped));

        Self {
            handle: Some(handle),
            stop,
        }
    }

    /// Collects the task's error if it has stopped on its own
    async fn failure(&mut self) -> Option<LarderError> {
        if !self.handle.as_ref().is_some_and(|h| h.is_finished()) {
            return None;
        }
        match self.handle.take()?.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(e) => Some(e.into()),
        }
    }

    async fn stop(mut self) -> Result<()> {
        let _ = self.stop.send(true);
        match self.handle.take() {
            Some(handle) => handle.await?,
            None => Ok(()),
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    store: Arc<dyn CheckpointStore>,
    state: Arc<CrawlState>,
    dispatcher: Dispatcher,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `session` - The session every dispatch fetches through
    /// * `store` - Where checkpoints and records are persisted
    /// * `fresh` - Ignore the persisted checkpoint (it is overwritten at the
    ///   first checkpoint of this run; no file is deleted)
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(LarderError)` - The checkpoint could not be loaded
    pub fn new(
        config: Config,
        session: Arc<dyn Session>,
        store: Arc<dyn CheckpointStore>,
        fresh: bool,
    ) -> Result<Self> {
        let state = if fresh {
            tracing::info!("Starting fresh; the existing checkpoint is ignored");
            CrawlState::new()
        } else {
            let checkpoint = store.load_checkpoint()?;
            tracing::info!(
                "Resuming with {} scraped and {} failed URLs",
                checkpoint.scraped.len(),
                checkpoint.failed.len()
            );
            CrawlState::from_checkpoint(checkpoint)
        };
        let state = Arc::new(state);

        let dispatcher = Dispatcher {
            session,
            store: Arc::clone(&store),
            state: Arc::clone(&state),
            policy: RetryPolicy::from_config(&config.crawler),
            site_marker: Arc::from(config.session.site_marker.as_str()),
        };

        Ok(Self {
            config: Arc::new(config),
            store,
            state,
            dispatcher,
        })
    }

    /// The shared dedup state
    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Runs the crawl loop over `frontier`
    ///
    /// Walks the frontier in order. Each URL is checked against the dedup
    /// sets first, then waits for an admission permit and is dispatched onto
    /// its own task. A checkpoint is written every `checkpoint-interval-secs`
    /// and once more when the frontier is drained.
    ///
    /// On a fatal error the remaining dispatches are aborted, a final
    /// checkpoint of what was recorded is still written, and the error is
    /// returned.
    pub async fn run(&self, frontier: Frontier) -> Result<CrawlSummary> {
        let started_at = Utc::now();
        tracing::info!(
            "Starting crawl of {} URLs with {} concurrent requests",
            frontier.len(),
            self.config.crawler.max_concurrent_requests
        );

        let mut scheduler = Scheduler::new(&self.config.crawler, frontier);
        let mut tasks = JoinSet::new();
        let mut checkpointer = CheckpointTask::spawn(
            Arc::clone(&self.state),
            Arc::clone(&self.store),
            self.config.crawler.checkpoint_interval(),
        );

        let outcome = self
            .drive(&mut scheduler, &mut tasks, &mut checkpointer)
            .await;

        if let Err(e) = &outcome {
            tracing::error!("Aborting crawl: {}", e);
            scheduler.close();
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }

        let stopped = checkpointer.stop().await;
        let state = Arc::clone(&self.state);
        let store = Arc::clone(&self.store);
        let last = tokio::task::spawn_blocking(move || write_checkpoint(&state, store.as_ref()))
            .await
            .map_err(LarderError::from)
            .and_then(|written| written);

        if let Err(e) = outcome {
            if let Err(checkpoint_error) = last {
                tracing::error!("Final checkpoint failed: {}", checkpoint_error);
            }
            return Err(e);
        }
        stopped?;
        last?;

        let totals = self.state.totals();
        let summary = CrawlSummary {
            started_at,
            finished_at: Utc::now(),
            processed: totals.processed,
            skipped: totals.skipped,
            failed: totals.failed,
            records_written: totals.scraped,
            scraped_total: self.state.scraped_len(),
            failed_total: self.state.failed_len(),
        };
        tracing::info!(
            "Crawl completed: {} processed, {} skipped, {} records written",
            summary.processed,
            summary.skipped,
            summary.records_written
        );

        Ok(summary)
    }

    /// Dispatches every frontier URL and waits for the dispatches to finish
    async fn drive(
        &self,
        scheduler: &mut Scheduler,
        tasks: &mut JoinSet<Result<DispatchOutcome>>,
        checkpointer: &mut CheckpointTask,
    ) -> Result<()> {
        let mut tally = DispatchTally::default();
        while let Some(url) = scheduler.next_candidate() {
            reap_finished(tasks, &mut tally)?;
            if let Some(e) = checkpointer.failure().await {
                return Err(e);
            }

            if self.state.check_and_skip(&url) {
                tracing::trace!("Skipping {}", url);
                continue;
            }

            let Some(scheduled) = scheduler.admit(url).await else {
                break;
            };
            self.state.record_processed();
            tracing::debug!(
                "Dispatching {} ({} in flight, {} remaining)",
                scheduled.url,
                scheduler.in_flight(),
                scheduler.remaining()
            );

            let dispatcher = self.dispatcher.clone();
            tasks.spawn(async move {
                let ScheduledFetch { url, _permit } = scheduled;
                dispatcher.dispatch(&url).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            tally.add(joined??);
        }
        if let Some(e) = checkpointer.failure().await {
            return Err(e);
        }

        tracing::info!(
            "Dispatches finished: {} succeeded with {} records, {} failed",
            tally.succeeded,
            tally.records,
            tally.failed
        );
        Ok(())
    }
}

/// Dispatches that ran to completion, by outcome
#[derive(Debug, Default, PartialEq, Eq)]
struct DispatchTally {
    succeeded: u64,
    failed: u64,
    records: usize,
}

impl DispatchTally {
    fn add(&mut self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Succeeded { records } => {
                self.succeeded += 1;
                self.records += records;
            }
            DispatchOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Collects dispatches that already finished, surfacing the first fatal error
fn reap_finished(
    tasks: &mut JoinSet<Result<DispatchOutcome>>,
    tally: &mut DispatchTally,
) -> Result<()> {
    while let Some(joined) = tasks.try_join_next() {
        tally.add(joined??);
    }
    Ok(())
}
