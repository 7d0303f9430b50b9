//! Crawler module for recipe page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry and backoff
//! - Embedded state extraction
//! - Admission control
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod scheduler;

pub use coordinator::Coordinator;
pub use extractor::{extract_state, page_title, ExtractError, Extracted};
pub use fetcher::{fetch_page, FetchResult, RetryPolicy};
pub use scheduler::{ScheduledFetch, Scheduler};

use crate::config::Config;
use crate::frontier::Frontier;
use crate::output::CrawlSummary;
use crate::session::Session;
use crate::storage::open_storage;
use crate::Result;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the output directory as the checkpoint store
/// 2. Load the frontier from the sitemap directory
/// 3. Restore the checkpoint (unless `fresh`)
/// 4. Dispatch every frontier URL through `session`
/// 5. Write the final checkpoint and return the run summary
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `session` - An established session (see [`crate::session::SessionProvider`])
/// * `fresh` - Ignore the persisted checkpoint
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed
/// * `Err(LarderError)` - Crawl aborted
///
/// # Example
///
/// ```no_run
/// use larder::config::load_config;
/// use larder::crawler::crawl;
/// use larder::session::{BrowserContext, HttpSessionProvider, SessionProvider};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let context = BrowserContext::from_config(&config.session)?;
/// let session = HttpSessionProvider::from_config(&config)
///     .new_session(&context)
///     .await?;
/// let summary = crawl(config, session, false).await?;
/// println!("{} records written", summary.records_written);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config, session: Arc<dyn Session>, fresh: bool) -> Result<CrawlSummary> {
    let store = Arc::new(open_storage(&config.output.directory)?);
    let frontier = Frontier::from_sitemap_dir(&config.output.sitemap_dir())?;

    let coordinator = Coordinator::new(config, session, store, fresh)?;
    coordinator.run(frontier).await
}
