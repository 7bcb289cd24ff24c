//! Error types for the research layer.

use thiserror::Error;

/// Errors produced while researching one candidate.
///
/// Optional page sections never produce these; they are absorbed into
/// absent or zeroed fields. Everything here ends the current candidate's
/// research and is recorded by the batch loop.
#[derive(Error, Debug)]
pub enum ResearchError {
    /// An expected page section is missing.
    #[error("{0}")]
    NotFound(String),
    /// The search matched more than one candidate.
    #[error("{count} candidates found for search string \"{search}\". Please disambiguate.")]
    Ambiguous { count: i64, search: String },
    /// A required page could not be fetched.
    #[error("fetch failed: {0}")]
    Fetch(#[source] vpap_client::Error),
    /// The browser session failed while reading a chart.
    #[error("browser session failed: {0}")]
    Session(#[source] vpap_client::Error),
    /// User-provided input failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<vpap_client::Error> for ResearchError {
    fn from(e: vpap_client::Error) -> Self {
        Self::Fetch(e)
    }
}
