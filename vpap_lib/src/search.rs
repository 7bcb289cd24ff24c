//! Resolving a free-text name to exactly one candidate page.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Serialize;
use vpap_client::SearchQuery;

use crate::coerce::{text_of, to_int, IntOrText};
use crate::error::ResearchError;
use crate::fetch::PageSource;

static CANDIDATES_HEADING: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.panel-heading.candidates").expect("static selector")
});
static COUNT_BADGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.badge").expect("static selector"));
static CANDIDATE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a.list-group-item[href*="/candidates/"]"#).expect("static selector")
});
static LINK_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.linklike").expect("static selector"));

/// Count assumed when the result badge is missing or unreadable. Anything
/// above one forces the caller to disambiguate.
const UNREADABLE_COUNT: i64 = 2;

/// The single candidate a search resolved to, with the pages to read next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateIdentity {
    /// The name as given, trimmed.
    pub search_string: String,
    /// The candidate's name as the site displays it.
    pub candidate_name: String,
    pub candidate_page_link: String,
    pub elections_page_link: String,
    pub legislator_page_link: String,
}

/// Runs the site search for `name` and resolves it to one candidate.
pub async fn disambiguate<P: PageSource>(
    pages: &P,
    name: &str,
) -> Result<CandidateIdentity, ResearchError> {
    let query = SearchQuery::for_name(name);
    let html = pages.fetch("/search/", Some(&query)).await?;
    parse_search_results(&html, name.trim(), pages.base_url())
}

/// Reads a search results page.
///
/// Fails with `NotFound` when there is no candidates section or no candidate
/// link, and with `Ambiguous` when the section reports more than one match.
pub fn parse_search_results(
    html: &str,
    search_string: &str,
    base_url: &str,
) -> Result<CandidateIdentity, ResearchError> {
    let document = Html::parse_document(html);

    let heading = document.select(&CANDIDATES_HEADING).next().ok_or_else(|| {
        ResearchError::NotFound(format!(
            "No candidates found for search string \"{}\".",
            search_string
        ))
    })?;

    let count = match text_of(heading.select(&COUNT_BADGE).next()) {
        None => UNREADABLE_COUNT,
        Some(badge) => match to_int(Some(&badge)) {
            IntOrText::Int(n) => n,
            IntOrText::Text(raw) => {
                tracing::debug!("Unreadable result count {:?}, assuming several", raw);
                UNREADABLE_COUNT
            }
        },
    };
    if count > 1 {
        return Err(ResearchError::Ambiguous {
            count,
            search: search_string.to_string(),
        });
    }

    let link = document.select(&CANDIDATE_LINK).next().ok_or_else(|| {
        ResearchError::NotFound(format!(
            "No candidate pages found for search query \"{}\".",
            search_string
        ))
    })?;
    let candidate_name = text_of(link.select(&LINK_NAME).next())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ResearchError::NotFound(format!(
                "Candidate link for \"{}\" carries no name.",
                search_string
            ))
        })?;

    let href = link.value().attr("href").unwrap_or_default();
    let candidate_page_link = vpap_client::absolute_url(base_url, href);

    Ok(CandidateIdentity {
        search_string: search_string.to_string(),
        candidate_name,
        elections_page_link: elections_link(&candidate_page_link),
        legislator_page_link: legislator_link(&candidate_page_link),
        candidate_page_link,
    })
}

/// `…/candidates/1234/` → `…/candidates/1234/elections/`.
pub fn elections_link(candidate_page_link: &str) -> String {
    if candidate_page_link.ends_with('/') {
        format!("{}elections/", candidate_page_link)
    } else {
        format!("{}/elections/", candidate_page_link)
    }
}

/// `…/candidates/1234/` → `…/legislators/1234/`.
pub fn legislator_link(candidate_page_link: &str) -> String {
    candidate_page_link.replacen("/candidates/", "/legislators/", 1)
}
