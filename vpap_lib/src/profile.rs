//! Candidate profile page: identity summary, IE flag and the current election panel.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use vpap_client::NoQuery;

use crate::coerce::{lines_of, squash_lines, text_of};
use crate::error::ResearchError;
use crate::fetch::PageSource;
use crate::rows::{parse_row, RowRecord, RowShape};
use crate::search::CandidateIdentity;

static SUMMARY_BOX: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"div[style="float:left;"]"#).expect("static selector"));
static NAME_HEADING: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"h3[style="margin-top:0;"]"#).expect("static selector")
});
static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("static selector"));
static SIDEBAR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul.vsubmenu").expect("static selector"));
static SIDEBAR_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("static selector"));
static BUTTON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a.btn[type="button"]"#).expect("static selector"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("static selector"));
static HEADER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h4").expect("static selector"));
static DATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.small").expect("static selector"));
static RESULTS_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.table").expect("static selector"));
static BODY_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr").expect("static selector"));

const IE_MENU_ENTRY: &str = "Independent Expenditures";
const ALL_ELECTIONS_MARKER: &str = "Show all elections for";
const FEDERAL_PATH: &str = "/candidates/federal/";
const FEDERAL_BUTTON: &str = "As Federal Candidate";
const STATE_BUTTON: &str = "As State/Local Candidate";

/// Static attributes of a candidate, read from the profile page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    /// Path segment after `/candidates/` in the profile link.
    pub candidate_id: String,
    pub name: Option<String>,
    /// First line of the summary paragraph.
    pub summary: Option<String>,
    /// `None` when the page has no sidebar menu.
    pub has_ie: Option<bool>,
    pub as_state_link: Option<String>,
    pub as_federal_link: Option<String>,
    pub current_election: Option<CurrentElection>,
}

/// The upcoming (or most recent) race shown on the profile page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentElection {
    pub office: Option<String>,
    pub link: Option<String>,
    pub date: Option<String>,
    /// Row whose last name occurs in the profile name.
    pub candidate: Option<RowRecord>,
    pub opponent: Option<RowRecord>,
}

/// Fetches and parses the profile page of an identified candidate.
pub async fn extract_profile<P: PageSource>(
    pages: &P,
    identity: &CandidateIdentity,
) -> Result<Profile, ResearchError> {
    let html = pages
        .fetch::<NoQuery>(&identity.candidate_page_link, None)
        .await?;
    Ok(parse_profile(
        &html,
        &identity.candidate_page_link,
        pages.base_url(),
    ))
}

/// Everything on the profile page is optional; missing sections leave fields unset.
pub fn parse_profile(html: &str, candidate_page_link: &str, base_url: &str) -> Profile {
    let document = Html::parse_document(html);

    let summary_box = document.select(&SUMMARY_BOX).next();
    let name = summary_box
        .and_then(|b| b.select(&NAME_HEADING).next())
        .map(|h| h.text().collect::<String>().trim().to_string());
    let summary = summary_box
        .and_then(|b| b.select(&PARAGRAPH).next())
        .and_then(|p| {
            let text = p.text().collect::<String>();
            lines_of(&text).first().map(|line| line.to_string())
        });

    let has_ie = document.select(&SIDEBAR).next().map(|menu| {
        menu.select(&SIDEBAR_ITEM)
            .any(|li| li.text().collect::<String>().trim() == IE_MENU_ENTRY)
    });

    let (as_federal_link, as_state_link) = federal_and_state_links(&document, base_url);

    let current_election = current_election_panel(&document)
        .map(|panel| parse_current_election(panel, name.as_deref().unwrap_or_default()));

    Profile {
        candidate_id: candidate_id(candidate_page_link),
        name,
        summary,
        has_ie,
        as_state_link,
        as_federal_link,
        current_election,
    }
}

/// `https://www.vpap.org/candidates/1234/` → `1234`.
pub fn candidate_id(candidate_page_link: &str) -> String {
    candidate_page_link
        .split_once("/candidates/")
        .map(|(_, rest)| rest.split('/').next().unwrap_or_default())
        .unwrap_or_default()
        .to_string()
}

/// The state/federal switch only appears for candidates who also ran federally.
fn federal_and_state_links(document: &Html, base_url: &str) -> (Option<String>, Option<String>) {
    let buttons: Vec<ElementRef<'_>> = document.select(&BUTTON).collect();
    let button_text = |b: &ElementRef<'_>| b.text().collect::<String>().trim().to_string();

    let federal = buttons
        .iter()
        .find(|b| {
            b.value()
                .attr("href")
                .is_some_and(|h| h.starts_with(FEDERAL_PATH))
        })
        .or_else(|| buttons.iter().find(|b| button_text(*b) == FEDERAL_BUTTON));
    let Some(federal) = federal else {
        return (None, None);
    };

    let link = |b: &ElementRef<'_>| {
        b.value()
            .attr("href")
            .map(|h| vpap_client::absolute_url(base_url, h))
    };
    let state = buttons
        .iter()
        .find(|b| button_text(*b) == STATE_BUTTON)
        .and_then(link);
    (link(federal), state)
}

fn current_election_panel(document: &Html) -> Option<ElementRef<'_>> {
    let marker = document
        .select(&ANCHOR)
        .find(|a| a.text().collect::<String>().contains(ALL_ELECTIONS_MARKER))?;
    marker.ancestors().filter_map(ElementRef::wrap).find(|el| {
        el.value().name() == "div" && el.value().classes().any(|c| c == "panel-body")
    })
}

fn parse_current_election(panel: ElementRef<'_>, profile_name: &str) -> CurrentElection {
    let mut election = CurrentElection {
        office: None,
        link: None,
        date: None,
        candidate: None,
        opponent: None,
    };

    if let Some(header) = panel.select(&HEADER).next() {
        if let Some(office_link) = header.select(&ANCHOR).next() {
            let office = squash_lines(&office_link.text().collect::<String>());
            if !office.is_empty() {
                election.office = Some(office);
                election.link = office_link.value().attr("href").map(str::to_string);
            }
        }
        election.date = text_of(header.select(&DATE).next()).map(|d| d.trim().to_string());
    }

    let Some(table) = panel.select(&RESULTS_TABLE).next() else {
        return election;
    };
    let subject = profile_name.to_lowercase();
    for row in table.select(&BODY_ROW).take(2) {
        let record = parse_row(row, RowShape::CurrentElection);
        let Some(name) = record.name.as_deref() else {
            continue;
        };
        let last_name = name.split(',').next().unwrap_or_default().trim().to_lowercase();
        let slot = if !last_name.is_empty() && subject.contains(&last_name) {
            &mut election.candidate
        } else {
            &mut election.opponent
        };
        if slot.is_none() {
            *slot = Some(record);
        }
    }
    election
}
