//! Authenticated fetching sessions
//!
//! Getting past the site's access challenge happens in a real browser,
//! outside this crate. What comes back from it is a [`BrowserContext`]
//! (cookies plus user agent), which a [`SessionProvider`] turns into a
//! [`Session`] shared by every concurrent fetch of the run.

mod context;
mod http;

pub use context::{parse_cookie_file, BrowserContext, BrowserCookie};
pub use http::{build_http_client, HttpSession, HttpSessionProvider};

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// A single HTTP response, as seen by the page fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A failed request attempt (connection refused, timeout, broken body...)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{url}: {message}")]
pub struct TransportError {
    pub url: String,
    pub message: String,
}

impl TransportError {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while establishing a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to read cookie file {}: {source}", .path.display())]
    CookieFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Session check failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Session check at {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Access challenge at {url} (page title {title:?}); renew the browser session")]
    AccessChallenge { url: String, title: String },
}

/// An authenticated fetch capability
///
/// One `get` is one attempt; retrying is the caller's business. A single
/// session is shared by every in-flight dispatch.
#[async_trait]
pub trait Session: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError>;
}

/// Turns a bypassed browser context into a session
#[async_trait]
pub trait SessionProvider {
    async fn new_session(&self, context: &BrowserContext)
        -> Result<Arc<dyn Session>, SessionError>;
}
