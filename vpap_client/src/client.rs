//! HTTP client for the server-rendered pages of vpap.org.

use std::time::Duration;

use url::Url;

use crate::{query::Query, user_agent::get_user_agent, Error};

/// Default site root. Relative links found in pages are resolved against it.
pub const DEFAULT_BASE_URL: &str = "https://www.vpap.org";

/// Default transport timeout for a single page request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP client for vpap.org HTML pages.
///
/// Sends requests with browser-like headers and a randomized user agent.
/// Each request builds a fresh `reqwest::Client` with the configured timeout.
/// A response counts as a failure when the status is not 2xx or the body is
/// blank, so callers never try to parse an error page as a document.
pub struct Client {
    /// Base URL for the site. Defaults to `https://www.vpap.org`.
    base_url: String,
    timeout: Duration,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a new client pointing at the production site.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The site root without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves a link as it appears in a page (`/candidates/1234/`) to an
    /// absolute URL. Absolute links are returned unchanged.
    pub fn absolute_url(&self, href: &str) -> String {
        absolute_url(&self.base_url, href)
    }

    fn get_url(&self, url: &str, query: Option<&impl Query>) -> Result<Url, Error> {
        let url = Url::parse(&self.absolute_url(url)).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        Ok(match query {
            Some(query) => query.add_to_url(&url),
            None => url,
        })
    }

    /// Fetches a page and returns its HTML body.
    pub async fn get_page<Q>(&self, url: &str, query: Option<&Q>) -> Result<String, Error>
    where
        Q: Query,
    {
        let url = self.get_url(url, query)?;
        let client = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        tracing::debug!("GET {}", url);
        let resp = client
            .get(url.clone())
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "en-US,en;q=0.9")
            .header("upgrade-insecure-requests", "1")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get {}: {}", url, e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::debug!("Request for {} failed with status {}", url, status);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        if body.trim().is_empty() {
            return Err(Error::EmptyDocument);
        }

        Ok(body)
    }
}

/// Joins a page-relative link onto a site root.
pub fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{}{}", base, href)
    } else {
        format!("{}/{}", base, href)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
