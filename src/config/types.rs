use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Larder
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub session: SessionConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of page dispatches in flight at once
    #[serde(rename = "max-concurrent-requests", default = "default_max_concurrent")]
    pub max_concurrent_requests: u32,

    /// Wall-clock period between checkpoint writes (seconds)
    #[serde(rename = "checkpoint-interval-secs", default = "default_checkpoint_interval")]
    pub checkpoint_interval_secs: u64,

    /// Number of retries after the first attempt of a page fetch
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "retry-base-delay-ms", default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Multiplier applied to the delay for each further retry
    #[serde(rename = "retry-backoff-factor", default = "default_retry_backoff_factor")]
    pub retry_backoff_factor: u32,

    /// Timeout for a single HTTP request (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Size of the worker-thread pool used for page extraction
    #[serde(rename = "blocking-threads", default = "default_blocking_threads")]
    pub blocking_threads: usize,
}

impl CrawlerConfig {
    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_secs(self.checkpoint_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
            checkpoint_interval_secs: default_checkpoint_interval(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay(),
            retry_backoff_factor: default_retry_backoff_factor(),
            request_timeout_secs: default_request_timeout(),
            blocking_threads: default_blocking_threads(),
        }
    }
}

/// Authenticated session configuration
///
/// The browser that gets past the site's access challenge is driven by hand;
/// its cookies are exported to `cookies-file` and picked up from there.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Site root, used to scope cookies and to validate the session
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Case-insensitive substring every genuine page title contains
    #[serde(rename = "site-marker")]
    pub site_marker: String,

    /// User agent of the browser the cookies were exported from
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,

    /// Cookie export (Netscape cookies.txt or `name=value` lines)
    #[serde(rename = "cookies-file", default)]
    pub cookies_file: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory for checkpoint files and recipe records
    pub directory: PathBuf,

    /// Directory holding the sitemap inputs (defaults to `<directory>/sitemaps`)
    #[serde(rename = "sitemap-directory", default)]
    pub sitemap_directory: Option<PathBuf>,
}

impl OutputConfig {
    pub fn sitemap_dir(&self) -> PathBuf {
        self.sitemap_directory
            .clone()
            .unwrap_or_else(|| self.directory.join("sitemaps"))
    }
}

fn default_max_concurrent() -> u32 {
    5
}

fn default_checkpoint_interval() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    3000
}

fn default_retry_backoff_factor() -> u32 {
    3
}

fn default_request_timeout() -> u64 {
    30
}

fn default_blocking_threads() -> usize {
    8
}
