//! Election history page: one cycle per recent general-election race.

use std::fmt;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Serialize;
use vpap_client::{NoQuery, RenderedSession};

use crate::config::ResearchConfig;
use crate::error::ResearchError;
use crate::fetch::PageSource;
use crate::ie::{extract_ie, IeAmounts};
use crate::profile::Profile;
use crate::rows::{parse_row, RowRecord, RowShape};

static MAIN_PANEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.col-12.col-lg-9").expect("static selector"));
static RACE_HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h4").expect("static selector"));
static RESULTS_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.table").expect("static selector"));
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("static selector"));
static BODY_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr").expect("static selector"));

/// Legislative chamber a race was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Chamber {
    Lower,
    Upper,
    Other,
}

impl Chamber {
    /// Classifies a race by its name.
    pub fn from_race_name(race_name: &str) -> Self {
        let lower = race_name.to_lowercase();
        if lower.contains("house of delegates") || lower.contains("assembly") {
            Chamber::Lower
        } else if lower.contains("state senate") {
            Chamber::Upper
        } else {
            Chamber::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Chamber::Lower => "lower",
            Chamber::Upper => "upper",
            Chamber::Other => "other",
        }
    }
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One general-election race the candidate's history lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectionCycle {
    pub year: i32,
    pub chamber: Chamber,
    pub race_name: String,
    pub race_link: String,
    /// Democratic and Republican rows, in table order.
    pub rows: Vec<RowRecord>,
    /// `None` when IE amounts were not looked up.
    pub ie: Option<IeAmounts>,
}

impl ElectionCycle {
    /// Prefix shared by every flattened key of this cycle, e.g. `2019_lower`.
    pub fn key_prefix(&self) -> String {
        format!("{}_{}", self.year, self.chamber)
    }
}

/// Fetches the elections page and, when a browser session is available and
/// the candidate has IE activity, reads the IE chart of every eligible race.
pub async fn extract_elections<P, S>(
    pages: &P,
    elections_page_link: &str,
    profile: &Profile,
    mut session: Option<&mut S>,
    config: &ResearchConfig,
) -> Result<Vec<ElectionCycle>, ResearchError>
where
    P: PageSource,
    S: RenderedSession,
{
    let html = pages.fetch::<NoQuery>(elections_page_link, None).await?;
    let mut cycles = parse_elections(&html, pages.base_url(), config)?;

    if profile.has_ie == Some(true) {
        if let Some(session) = session.as_deref_mut() {
            for cycle in &mut cycles {
                let amounts = extract_ie(session, &profile.candidate_id, &cycle.race_link).await?;
                cycle.ie = Some(amounts);
            }
        }
    }
    Ok(cycles)
}

/// Reads eligible races from an elections page. `ie` is left unset.
///
/// Fails only when the page has no elections panel; malformed races are
/// skipped with a warning.
pub fn parse_elections(
    html: &str,
    base_url: &str,
    config: &ResearchConfig,
) -> Result<Vec<ElectionCycle>, ResearchError> {
    let document = Html::parse_document(html);
    let panel = document
        .select(&MAIN_PANEL)
        .next()
        .ok_or_else(|| ResearchError::NotFound("No elections panel found.".to_string()))?;

    let headings = panel.select(&RACE_HEADING).take(config.max_races);
    let tables = panel.select(&RESULTS_TABLE).take(config.max_races);

    let mut cycles = Vec::new();
    for (heading, table) in headings.zip(tables) {
        let Some(link) = heading.select(&LINK).next() else {
            tracing::warn!(
                "Skipping race heading without link: {:?}",
                heading.text().collect::<String>().trim()
            );
            continue;
        };
        let race_name = link.text().collect::<String>().trim().to_string();
        let Some(year) = race_name
            .split_whitespace()
            .next()
            .and_then(|token| token.parse::<i32>().ok())
        else {
            tracing::warn!("Skipping race without a leading year: {:?}", race_name);
            continue;
        };

        if year < config.min_year || !race_name.to_lowercase().contains("general") {
            tracing::debug!("Ignoring race {:?}", race_name);
            continue;
        }

        let rows = table
            .select(&BODY_ROW)
            .take(2)
            .map(|row| parse_row(row, RowShape::Fundraising))
            .filter(RowRecord::is_major_party)
            .collect();

        cycles.push(ElectionCycle {
            year,
            chamber: Chamber::from_race_name(&race_name),
            race_link: vpap_client::absolute_url(
                base_url,
                link.value().attr("href").unwrap_or_default(),
            ),
            race_name,
            rows,
            ie: None,
        });
    }
    Ok(cycles)
}
