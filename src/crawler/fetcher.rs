//! Page fetching with retry
//!
//! This module wraps a [`Session`] with the retry policy of the crawl:
//! - 2xx responses are content
//! - 404 and 410 are final, never retried
//! - Any other status and every transport error is retried with exponential
//!   backoff until the retry budget is spent

use crate::config::CrawlerConfig;
use crate::session::Session;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// The page body of a 2xx response
    Content(String),

    /// The page does not exist (404/410); retrying will not help
    NotFound {
        /// The HTTP status code
        status: u16,
    },

    /// Every attempt failed
    Exhausted {
        /// Number of attempts made, including the first
        attempts: u32,
        /// Description of the last failure
        last_error: String,
    },
}

/// Retry budget and backoff shape for page fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Multiplier applied to the delay for every further retry
    pub factor: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            factor: config.retry_backoff_factor,
        }
    }

    /// Delay before retry `retry` (0-based): `base * factor^retry`, saturating
    pub fn delay(&self, retry: u32) -> Duration {
        let multiplier = self.factor.saturating_pow(retry);
        self.base_delay.saturating_mul(multiplier)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

fn is_not_found(status: u16) -> bool {
    status == 404 || status == 410
}

/// Fetches a page, retrying transient failures
///
/// # Arguments
///
/// * `session` - The shared session to fetch through
/// * `url` - The URL to fetch
/// * `policy` - Retry budget and backoff
///
/// # Returns
///
/// A FetchResult; this function never fails outright
pub async fn fetch_page(session: &dyn Session, url: &str, policy: &RetryPolicy) -> FetchResult {
    let mut retry = 0;

    loop {
        let last_error = match session.get(url).await {
            Ok(response) if response.is_success() => return FetchResult::Content(response.body),
            Ok(response) if is_not_found(response.status) => {
                return FetchResult::NotFound {
                    status: response.status,
                }
            }
            Ok(response) => format!("HTTP {}", response.status),
            Err(e) => e.message,
        };

        if retry >= policy.max_retries {
            return FetchResult::Exhausted {
                attempts: retry + 1,
                last_error,
            };
        }

        let delay = policy.delay(retry);
        tracing::debug!(
            "Fetch of {} failed ({}), retry {}/{} in {:?}",
            url,
            last_error,
            retry + 1,
            policy.max_retries,
            delay
        );
        tokio::time::sleep(delay).await;
        retry += 1;
    }
}
