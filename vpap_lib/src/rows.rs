//! Parsing of one candidate line of an election results table.
//!
//! Both the elections page and the "current election" panel use the same
//! row layout: a candidate cell followed by figure cells. Only the figure
//! cells differ, selected by [`RowShape`].

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use serde::Serialize;

use crate::coerce::{lines_of, text_of, to_currency, to_int, to_percent, IntOrText};

static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("static selector"));
static BADGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.badge").expect("static selector"));
static FINANCE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href*="/finance_summary/"]"#).expect("static selector")
});

/// Candidate-cell phrases marking a line that is not an actual candidacy.
const NON_CANDIDACY_PHRASES: &[&str] = &[
    "withdrawn candidates",
    "did not seek",
    "sought other office",
    "failed to",
];

/// Which figure cells follow the candidate cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// One cell linking to the finance summary (elections history tables).
    Fundraising,
    /// Spent, votes and vote share (current election panel).
    CurrentElection,
}

/// Figures read from the cells after the candidate cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RowFigures {
    Fundraising {
        money_raised_text: Option<String>,
        money_raised: Option<f64>,
    },
    CurrentElection {
        spent_text: Option<String>,
        spent: Option<f64>,
        votes_text: Option<String>,
        votes: Option<IntOrText>,
        voteshare_text: Option<String>,
        voteshare: Option<f64>,
    },
}

impl RowFigures {
    fn empty(shape: RowShape) -> Self {
        match shape {
            RowShape::Fundraising => RowFigures::Fundraising {
                money_raised_text: None,
                money_raised: None,
            },
            RowShape::CurrentElection => RowFigures::CurrentElection {
                spent_text: None,
                spent: None,
                votes_text: None,
                votes: None,
                voteshare_text: None,
                voteshare: None,
            },
        }
    }

    /// Money raised, for fundraising rows.
    pub fn money_raised(&self) -> Option<f64> {
        match self {
            RowFigures::Fundraising { money_raised, .. } => *money_raised,
            RowFigures::CurrentElection { .. } => None,
        }
    }
}

/// One candidate's line in a results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowRecord {
    /// Display name, incumbency marker removed. Unset for non-candidacy lines.
    pub name: Option<String>,
    /// Single-letter party code, e.g. `D`.
    pub party: Option<String>,
    /// The name carried the trailing `*` incumbency marker.
    pub incumbent: Option<bool>,
    /// The candidate cell carried a winner badge.
    pub winner: Option<bool>,
    pub figures: RowFigures,
}

impl RowRecord {
    /// True when the party is one of the two major parties.
    pub fn is_major_party(&self) -> bool {
        matches!(self.party.as_deref(), Some("D") | Some("R"))
    }
}

/// Parses a `<tr>` into a [`RowRecord`] of the given shape.
pub fn parse_row(row: ElementRef<'_>, shape: RowShape) -> RowRecord {
    let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
    let mut record = RowRecord {
        name: None,
        party: None,
        incumbent: None,
        winner: None,
        figures: RowFigures::empty(shape),
    };

    let Some((candidate_cell, remaining)) = cells.split_first() else {
        return record;
    };

    read_candidate_cell(*candidate_cell, &mut record);
    record.figures = match shape {
        RowShape::Fundraising => fundraising_figures(remaining),
        RowShape::CurrentElection => current_election_figures(remaining),
    };
    record
}

fn read_candidate_cell(cell: ElementRef<'_>, record: &mut RowRecord) {
    let text = cell.text().collect::<String>();
    if text.trim().is_empty() {
        return;
    }
    let lower = text.to_lowercase();
    if NON_CANDIDACY_PHRASES.iter().any(|p| lower.contains(p)) {
        return;
    }

    record.winner = Some(cell.select(&BADGE).next().is_some());

    let lines = lines_of(&text);
    if let [name, party, ..] = lines.as_slice() {
        let incumbent = name.ends_with('*');
        record.name = Some(name.replace('*', "").trim().to_string());
        record.incumbent = Some(incumbent);
        record.party = Some(party.replace(['(', ')'], "").trim().to_string());
    }
}

fn finance_link_text(cell: ElementRef<'_>) -> Option<String> {
    text_of(cell.select(&FINANCE_LINK).next()).map(|t| t.trim().to_string())
}

fn fundraising_figures(remaining: &[ElementRef<'_>]) -> RowFigures {
    let money_raised_text = remaining.first().and_then(|cell| finance_link_text(*cell));
    let money_raised = money_raised_text.as_deref().map(|t| to_currency(Some(t)));
    RowFigures::Fundraising {
        money_raised_text,
        money_raised,
    }
}

fn current_election_figures(remaining: &[ElementRef<'_>]) -> RowFigures {
    if remaining.is_empty() {
        return RowFigures::empty(RowShape::CurrentElection);
    }
    let cell = |i: usize| remaining.get(i).copied();

    let spent_text = cell(0).and_then(finance_link_text);
    let spent = spent_text
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| to_currency(Some(t)));

    let votes_text = cell(1).map(|c| c.text().collect::<String>().trim().to_string());
    let votes = votes_text
        .as_deref()
        .map(|t| to_int(Some(&t.replace(',', ""))));

    let voteshare_text = cell(2).map(|c| c.text().collect::<String>().trim().to_string());
    let voteshare = voteshare_text.as_deref().map(|t| to_percent(Some(t)));

    RowFigures::CurrentElection {
        spent_text,
        spent,
        votes_text,
        votes,
        voteshare_text,
        voteshare,
    }
}
