//! Legislator biography panel.
//!
//! Only sitting or former legislators have a legislator page; for everyone
//! else the page is missing and the bio is simply empty.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Serialize;
use vpap_client::NoQuery;

use crate::coerce::{snake_label, text_of, to_int, IntOrText};
use crate::error::ResearchError;
use crate::fetch::PageSource;

static BIO_PANEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.panel-group div.panel-body div.panel-body").expect("static selector")
});
static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("static selector"));
static LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.small_upper").expect("static selector"));
static VALUE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong").expect("static selector"));

const LENGTH_OF_SERVICE_KEY: &str = "bio_length_of_service";
const MEMBER_SINCE_PREFIX: &str = "Member since ";
const YEARS_SUFFIX: &str = " years of service";

/// Labeled attributes from the legislator page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LegislativeBio {
    /// `bio_<label>` → value text. Never contains `bio_length_of_service`;
    /// that entry is split into the two fields below.
    pub attributes: BTreeMap<String, Option<String>>,
    pub member_since: Option<IntOrText>,
    pub years_of_service: Option<IntOrText>,
}

impl LegislativeBio {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.member_since.is_none() && self.years_of_service.is_none()
    }
}

/// Fetches the legislator page. A missing page yields an empty bio; transport
/// failures are returned.
pub async fn extract_bio<P: PageSource>(
    pages: &P,
    legislator_page_link: &str,
) -> Result<LegislativeBio, ResearchError> {
    match pages.fetch::<NoQuery>(legislator_page_link, None).await {
        Ok(html) => Ok(parse_bio(&html)),
        Err(e) if e.is_page_miss() => {
            tracing::debug!("No legislator page at {}: {}", legislator_page_link, e);
            Ok(LegislativeBio::default())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn parse_bio(html: &str) -> LegislativeBio {
    let document = Html::parse_document(html);
    let Some(panel) = document.select(&BIO_PANEL).next() else {
        return LegislativeBio::default();
    };

    let mut attributes = BTreeMap::new();
    for paragraph in panel.select(&PARAGRAPH) {
        let Some(label) = text_of(paragraph.select(&LABEL).next()) else {
            continue;
        };
        let label = label.trim();
        if label.is_empty() {
            continue;
        }
        let value = text_of(paragraph.select(&VALUE).next()).map(|v| v.trim().to_string());
        attributes.insert(format!("bio_{}", snake_label(label)), value);
    }

    let (member_since, years_of_service) = match attributes.remove(LENGTH_OF_SERVICE_KEY) {
        Some(value) => split_length_of_service(value.as_deref().unwrap_or_default()),
        None => (None, None),
    };

    LegislativeBio {
        attributes,
        member_since,
        years_of_service,
    }
}

/// `"Member since 2014; 9 years of service"` → `(2014, 9)`.
fn split_length_of_service(value: &str) -> (Option<IntOrText>, Option<IntOrText>) {
    match value.split_once(';') {
        Some((since, years)) => (
            Some(to_int(Some(&since.replace(MEMBER_SINCE_PREFIX, "")))),
            Some(to_int(Some(&years.replace(YEARS_SUFFIX, "")))),
        ),
        None => (Some(to_int(Some(&value.replace(MEMBER_SINCE_PREFIX, "")))), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StaticPages;

    const BIO_PAGE: &str = r#"<html><body>
        <div class="panel-group">
          <div class="panel panel-default">
            <div class="panel-body">
              <div class="panel-body">
                <p><span class="small_upper">Party / Caucus:</span> <strong>Republican</strong></p>
                <p><span class="small_upper">District:</span> <strong> 12th </strong></p>
                <p><span class="small_upper">Length of Service:</span>
                   <strong>Member since 2014; 9 years of service</strong></p>
                <p>Unlabeled note</p>
                <p><span class="small_upper">Committees:</span></p>
              </div>
            </div>
          </div>
        </div></body></html>"#;

    #[test]
    fn labeled_attributes_and_service() {
        let bio = parse_bio(BIO_PAGE);
        assert_eq!(
            bio.attributes.get("bio_party_caucus"),
            Some(&Some("Republican".to_string()))
        );
        assert_eq!(
            bio.attributes.get("bio_district"),
            Some(&Some("12th".to_string()))
        );
        assert_eq!(bio.attributes.get("bio_committees"), Some(&None));
        assert!(!bio.attributes.contains_key(LENGTH_OF_SERVICE_KEY));
        assert_eq!(bio.attributes.len(), 3);
        assert_eq!(bio.member_since, Some(IntOrText::Int(2014)));
        assert_eq!(bio.years_of_service, Some(IntOrText::Int(9)));
    }

    #[test]
    fn service_without_semicolon_sets_member_since_only() {
        assert_eq!(
            split_length_of_service("Member since 2022"),
            (Some(IntOrText::Int(2022)), None)
        );
        assert_eq!(
            split_length_of_service("Member since 2020; less than one years of service"),
            (
                Some(IntOrText::Int(2020)),
                Some(IntOrText::Text("less than one".into()))
            )
        );
    }

    #[test]
    fn missing_panel_is_empty() {
        let bio = parse_bio("<html><body><div class=\"panel-group\"></div></body></html>");
        assert!(bio.is_empty());
    }

    #[test]
    fn missing_service_leaves_derived_fields_unset() {
        let page = BIO_PAGE.replace("Length of Service:", "Occupation:");
        let bio = parse_bio(&page);
        assert_eq!(bio.member_since, None);
        assert_eq!(bio.years_of_service, None);
        assert!(bio.attributes.contains_key("bio_occupation"));
    }

    #[tokio::test]
    async fn missing_legislator_page_is_empty_bio() {
        let pages = StaticPages::new("https://www.vpap.org");
        let bio = extract_bio(&pages, "https://www.vpap.org/legislators/1234/")
            .await
            .unwrap();
        assert!(bio.is_empty());
    }

    #[tokio::test]
    async fn fetches_legislator_page() {
        let pages =
            StaticPages::new("https://www.vpap.org").with_page("/legislators/1234/", BIO_PAGE);
        let bio = extract_bio(&pages, "https://www.vpap.org/legislators/1234/")
            .await
            .unwrap();
        assert_eq!(bio.member_since, Some(IntOrText::Int(2014)));
    }
}
