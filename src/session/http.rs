//! reqwest-backed sessions
//!
//! The client carries the browser's cookies in its jar and presents the
//! browser's user agent, so the site sees the same visitor that passed the
//! access challenge.

use crate::config::Config;
use crate::crawler::page_title;
use crate::session::{
    BrowserContext, RawResponse, Session, SessionError, SessionProvider, TransportError,
};
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Builds an HTTP client seeded with the browser context
///
/// # Arguments
///
/// * `context` - Cookies and user agent exported from the browser
/// * `timeout` - Timeout for a whole request
pub fn build_http_client(
    context: &BrowserContext,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let jar = Jar::default();
    for cookie in &context.cookies {
        jar.add_cookie_str(&cookie.to_set_cookie(), &context.base_url);
    }

    let mut builder = Client::builder()
        .cookie_provider(Arc::new(jar))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(user_agent) = &context.user_agent {
        builder = builder.user_agent(user_agent.as_str());
    }

    builder.build()
}

/// A session over a shared reqwest client
///
/// `reqwest::Client` is internally reference-counted and safe to use from
/// many tasks at once.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify(url, e))?;

        Ok(RawResponse { status, body })
    }
}

fn classify(url: &str, error: reqwest::Error) -> TransportError {
    let message = if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    };
    TransportError::new(url, message)
}

/// Creates [`HttpSession`]s and checks they get past the access challenge
#[derive(Debug, Clone)]
pub struct HttpSessionProvider {
    timeout: Duration,
    site_marker: String,
}

impl HttpSessionProvider {
    pub fn new(timeout: Duration, site_marker: impl Into<String>) -> Self {
        Self {
            timeout,
            site_marker: site_marker.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.crawler.request_timeout(),
            config.session.site_marker.clone(),
        )
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    /// Builds the session, then fetches the site root once to make sure the
    /// cookies still pass the access challenge
    async fn new_session(
        &self,
        context: &BrowserContext,
    ) -> Result<Arc<dyn Session>, SessionError> {
        let session = HttpSession::new(build_http_client(context, self.timeout)?);
        let url = context.base_url.as_str();

        tracing::info!("Checking session against {}", url);
        let response = session.get(url).await?;
        if !response.is_success() {
            return Err(SessionError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        let title = page_title(&response.body).unwrap_or_default();
        if !title
            .to_lowercase()
            .contains(&self.site_marker.to_lowercase())
        {
            return Err(SessionError::AccessChallenge {
                url: url.to_string(),
                title,
            });
        }

        tracing::info!("Session established");
        Ok(Arc::new(session))
    }
}
