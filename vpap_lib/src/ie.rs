//! Independent-expenditure amounts read from the client-rendered race chart.

use serde::Serialize;
use vpap_client::RenderedSession;

use crate::coerce::to_currency;
use crate::error::ResearchError;

const DETAILS_ID: &str = "ie_details";
const CHART_ID: &str = "svgchart";
const BAR_CLASS: &str = "barlink";
const RECT_CLASS: &str = "g_rect";
const AMOUNT_CLASS: &str = "amount";

/// Support and opposition spending for the subject in one race.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IeAmounts {
    pub support_amount_text: String,
    pub support_amount: f64,
    pub oppose_amount_text: String,
    pub oppose_amount: f64,
}

impl Default for IeAmounts {
    fn default() -> Self {
        Self {
            support_amount_text: "0".into(),
            support_amount: 0.0,
            oppose_amount_text: "0".into(),
            oppose_amount: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Support,
    Oppose,
}

impl IeAmounts {
    fn record(&mut self, position: Position, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let amount = to_currency(Some(text));
        match position {
            Position::Support => {
                self.support_amount_text = text.to_string();
                self.support_amount = amount;
            }
            Position::Oppose => {
                self.oppose_amount_text = text.to_string();
                self.oppose_amount = amount;
            }
        }
    }
}

/// Loads the race page in the browser and reads the subject's bars from the
/// IE chart. A page without a chart yields zeros.
pub async fn extract_ie<S: RenderedSession>(
    session: &mut S,
    candidate_id: &str,
    race_link: &str,
) -> Result<IeAmounts, ResearchError> {
    read_chart(session, candidate_id, race_link)
        .await
        .map_err(ResearchError::Session)
}

async fn read_chart<S: RenderedSession>(
    session: &mut S,
    candidate_id: &str,
    race_link: &str,
) -> Result<IeAmounts, vpap_client::Error> {
    let mut amounts = IeAmounts::default();
    session.navigate(race_link).await?;

    let Some(details) = session.find_by_id(None, DETAILS_ID).await? else {
        tracing::debug!("No IE details on {}", race_link);
        return Ok(amounts);
    };
    let Some(chart) = session.find_by_id(Some(&details), CHART_ID).await? else {
        tracing::debug!("IE details without chart on {}", race_link);
        return Ok(amounts);
    };
    let Some(svg) = session.find_by_tag(&chart, "svg").await? else {
        return Ok(amounts);
    };

    for bar in session.find_all_by_class(&svg, BAR_CLASS).await? {
        let href = session.href(&bar).await?.unwrap_or_default();
        let Some(position) = subject_position(href.resolved(), candidate_id) else {
            continue;
        };
        let Some(rect) = session.find_by_class(&bar, RECT_CLASS).await? else {
            continue;
        };
        let Some(label) = session.find_by_class(&rect, AMOUNT_CLASS).await? else {
            continue;
        };
        let text = session.text(&label).await?;
        amounts.record(position, &text);
    }
    Ok(amounts)
}

/// The bar's position when its link points at `candidate_id`.
fn subject_position(href: &str, candidate_id: &str) -> Option<Position> {
    let query = href.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or_default();

    let mut candidate = None;
    let mut position = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "candidate" => candidate = Some(value.into_owned()),
            "position" => position = Some(value.into_owned()),
            _ => {}
        }
    }
    if candidate.as_deref() != Some(candidate_id) {
        return None;
    }
    match position.as_deref() {
        Some("support") => Some(Position::Support),
        Some("oppose") => Some(Position::Oppose),
        _ => None,
    }
}
