//! Polite page fetching: the document source used by every extractor.

use std::time::Duration;

use vpap_client::{Client, Error, Query};

use crate::config::ResearchConfig;

/// Something that can hand back the HTML of a site page.
///
/// Implemented by [`PoliteClient`] for the live site; tests substitute
/// in-memory pages.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Site root used to resolve relative links found in pages.
    fn base_url(&self) -> &str;

    /// Resolves a page-relative link against [`PageSource::base_url`].
    fn absolute_url(&self, href: &str) -> String {
        vpap_client::absolute_url(self.base_url(), href)
    }

    /// Fetches `url` (absolute or site-relative) with optional query parameters.
    async fn fetch<Q: Query>(&self, url: &str, query: Option<&Q>) -> Result<String, Error>;
}

/// Page client that pauses for a fixed delay after every request.
///
/// There is no retry: a failed fetch is returned immediately (after the
/// pause) and fails whatever extraction needed the page.
pub struct PoliteClient {
    inner: Client,
    delay: Duration,
}

impl PoliteClient {
    /// Creates a client for `config.base_url` with the configured delay and timeout.
    pub fn new(config: &ResearchConfig) -> Self {
        Self {
            inner: Client::with_base_url(&config.base_url).with_timeout(config.request_timeout),
            delay: config.request_delay,
        }
    }

    /// Wraps an existing client with a custom delay. Used for testing.
    pub fn with_client(inner: Client, delay: Duration) -> Self {
        Self { inner, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl PageSource for PoliteClient {
    fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    async fn fetch<Q: Query>(&self, url: &str, query: Option<&Q>) -> Result<String, Error> {
        let result = self.inner.get_page(url, query).await;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        result
    }
}
