//! Admission control for page dispatches
//!
//! This module handles:
//! - Walking the frontier in order
//! - Global concurrency limiting via a semaphore

use crate::config::CrawlerConfig;
use crate::frontier::Frontier;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A URL admitted for dispatch
///
/// The permit is held for the whole dispatch (fetch, extraction and
/// persistence) and released when the value is dropped.
pub struct ScheduledFetch {
    /// The URL to dispatch
    pub url: String,

    /// The semaphore permit for this dispatch
    pub _permit: OwnedSemaphorePermit,
}

/// Scheduler hands out frontier URLs under the concurrency limit
pub struct Scheduler {
    /// Global semaphore bounding in-flight dispatches
    global_semaphore: Arc<Semaphore>,

    /// Frontier URLs in dispatch order
    frontier: std::vec::IntoIter<String>,

    /// Maximum number of in-flight dispatches
    limit: usize,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `frontier` - URLs to dispatch, in order
    pub fn new(config: &CrawlerConfig, frontier: Frontier) -> Self {
        let limit = config.max_concurrent_requests as usize;
        Self {
            global_semaphore: Arc::new(Semaphore::new(limit)),
            frontier: frontier.into_urls().into_iter(),
            limit,
        }
    }

    /// Takes the next frontier URL without admitting it
    ///
    /// The caller decides whether the URL still needs dispatching before
    /// paying for a permit.
    pub fn next_candidate(&mut self) -> Option<String> {
        self.frontier.next()
    }

    /// Waits until fewer than `limit` dispatches are in flight
    ///
    /// # Returns
    ///
    /// * `Some(ScheduledFetch)` - The URL with its permit
    /// * `None` - The semaphore was closed
    pub async fn admit(&self, url: String) -> Option<ScheduledFetch> {
        let permit = self.global_semaphore.clone().acquire_owned().await.ok()?;
        Some(ScheduledFetch {
            url,
            _permit: permit,
        })
    }

    /// Number of frontier URLs not yet handed out
    pub fn remaining(&self) -> usize {
        self.frontier.len()
    }

    /// Number of dispatches currently holding a permit
    pub fn in_flight(&self) -> usize {
        self.limit - self.global_semaphore.available_permits()
    }

    /// Stops admitting; pending and future `admit` calls return `None`
    pub fn close(&self) {
        self.global_semaphore.close();
    }
}
