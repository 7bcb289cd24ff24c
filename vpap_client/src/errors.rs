//! Error types for the page and browser clients.

/// Errors that can occur when fetching pages or driving the browser session.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or unreadable response).
    #[error("Request failed")]
    RequestFailed,
    /// The site returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The site answered with a success status but an empty document.
    #[error("Empty document")]
    EmptyDocument,
    /// The WebDriver server rejected a command or returned an unexpected payload.
    #[error("WebDriver error: {0}")]
    WebDriver(String),
}

impl Error {
    /// True when the failure came from the page itself (bad status or empty
    /// body) rather than from the transport.
    pub fn is_page_miss(&self) -> bool {
        matches!(self, Error::HttpStatus { .. } | Error::EmptyDocument)
    }
}
