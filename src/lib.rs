//! Larder: a resumable recipe crawler
//!
//! This crate walks recipe-page URLs listed in sitemap files, decodes the state
//! blob embedded in every page and flattens it (together with the related
//! recipes nested inside it) into independent recipe records on disk. Progress
//! is checkpointed so an interrupted crawl picks up where it stopped.

pub mod config;
pub mod crawler;
pub mod frontier;
pub mod output;
pub mod recipe;
pub mod session;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Larder operations
///
/// Only errors that abort a whole run end up here. Per-URL problems
/// (transient HTTP failures, missing recipes, malformed payloads) are
/// recorded as [`state::DispatchOutcome::Failed`] instead.
#[derive(Debug, Error)]
pub enum LarderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] session::SessionError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Sitemap error: {0}")]
    Sitemap(String),

    #[error(
        "Access challenge at {url} (page title {title:?}); the browser session must be renewed"
    )]
    AccessChallenge { url: String, title: String },

    #[error("Dispatch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Larder operations
pub type Result<T> = std::result::Result<T, LarderError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, Coordinator};
pub use frontier::Frontier;
pub use recipe::{flatten, RecipeRecord};
pub use state::{CrawlState, DispatchOutcome};
pub use storage::{CheckpointStore, DirectoryStore};
