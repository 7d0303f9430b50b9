use crate::config::SessionConfig;
use crate::session::SessionError;
use url::Url;

/// A cookie exported from the browser that passed the access challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
}

impl BrowserCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }

    /// Renders the cookie as a `Set-Cookie` value for seeding a cookie jar
    pub fn to_set_cookie(&self) -> String {
        let mut header = format!("{}={}", self.name, self.value);
        if let Some(domain) = &self.domain {
            header.push_str("; Domain=");
            header.push_str(domain.trim_start_matches('.'));
        }
        header.push_str("; Path=");
        header.push_str(self.path.as_deref().unwrap_or("/"));
        header
    }
}

/// Everything carried over from the bypassed browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserContext {
    pub base_url: Url,
    pub user_agent: Option<String>,
    pub cookies: Vec<BrowserCookie>,
}

impl BrowserContext {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            user_agent: None,
            cookies: Vec::new(),
        }
    }

    /// Builds the context described by the `[session]` config section
    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SessionError::InvalidBaseUrl(format!("{}: {}", config.base_url, e)))?;

        let cookies = match &config.cookies_file {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| SessionError::CookieFile {
                        path: path.clone(),
                        source,
                    })?;
                parse_cookie_file(&content)
            }
            None => Vec::new(),
        };

        if cookies.is_empty() {
            tracing::warn!(
                "No browser cookies configured; the session may hit an access challenge"
            );
        } else {
            tracing::info!("Loaded {} browser cookies", cookies.len());
        }

        Ok(Self {
            base_url,
            user_agent: config.user_agent.clone(),
            cookies,
        })
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_cookie(mut self, cookie: BrowserCookie) -> Self {
        self.cookies.push(cookie);
        self
    }
}

/// Parses a cookie export
///
/// Accepts Netscape `cookies.txt` lines (seven tab-separated fields, with
/// `#HttpOnly_` marking HTTP-only cookies) as well as `name=value` pairs,
/// several per line separated by `;` as in a copied `Cookie` header.
/// Other `#` lines are comments.
pub fn parse_cookie_file(content: &str) -> Vec<BrowserCookie> {
    let mut cookies = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        let line = match line.strip_prefix("#HttpOnly_") {
            Some(rest) => rest,
            None if line.starts_with('#') || line.is_empty() => continue,
            None => line,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() == 7 {
            cookies.push(BrowserCookie {
                name: fields[5].to_string(),
                value: fields[6].to_string(),
                domain: Some(fields[0].to_string()).filter(|d| !d.is_empty()),
                path: Some(fields[2].to_string()).filter(|p| !p.is_empty()),
            });
            continue;
        }

        for pair in line.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    cookies.push(BrowserCookie::new(name, value.trim()));
                }
            }
        }
    }

    cookies
}
