//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use vpap_lib::vpap_client::{AnimatedHref, Client, Error, RenderedSession};
use vpap_lib::{PoliteClient, ResearchConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {}", path, e))
}

pub fn polite_client(server: &MockServer) -> PoliteClient {
    PoliteClient::with_client(Client::with_base_url(&server.uri()), Duration::ZERO)
}

pub fn config(server: &MockServer) -> ResearchConfig {
    ResearchConfig {
        base_url: server.uri(),
        request_delay: Duration::ZERO,
        ..ResearchConfig::default()
    }
}

pub async fn mount_page(server: &MockServer, page_path: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

pub async fn mount_search(server: &MockServer, q: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("q", q))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Jane Doe's site: single search hit, profile, elections, no legislator page.
pub async fn mount_jane_doe(server: &MockServer) {
    mount_search(server, "jane doe", &fixture("search_single.html")).await;
    mount_page(server, "/candidates/1234/", 200, &fixture("candidate.html")).await;
    mount_page(
        server,
        "/candidates/1234/elections/",
        200,
        &fixture("elections.html"),
    )
    .await;
    mount_page(server, "/legislators/1234/", 404, "Not Found").await;
}

/// One rendered chart bar: link target and the amount label inside it.
#[derive(Clone, Debug)]
pub struct Bar {
    pub href: String,
    pub amount: String,
}

/// Browser stand-in serving IE charts by URL suffix.
///
/// Elements are addressed by a small path enum; a page either has a chart
/// made of `bars` or has no IE details at all.
#[derive(Default)]
pub struct FakeSession {
    pub charts: Vec<(String, Vec<Bar>)>,
    pub visited: Vec<String>,
    current: Option<Vec<Bar>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FakeElement {
    Details,
    Chart,
    Svg,
    Bar(usize),
    Rect(usize),
    Amount(usize),
}

impl FakeSession {
    pub fn with_chart(mut self, url_suffix: &str, bars: Vec<Bar>) -> Self {
        self.charts.push((url_suffix.to_string(), bars));
        self
    }

    fn bars(&self) -> &[Bar] {
        self.current.as_deref().unwrap_or_default()
    }
}

impl RenderedSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&mut self, url: &str) -> Result<(), Error> {
        self.visited.push(url.to_string());
        self.current = self
            .charts
            .iter()
            .find(|(suffix, _)| url.ends_with(suffix.as_str()))
            .map(|(_, bars)| bars.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        scope: Option<&FakeElement>,
        id: &str,
    ) -> Result<Option<FakeElement>, Error> {
        if self.current.is_none() {
            return Ok(None);
        }
        Ok(match (scope, id) {
            (None, "ie_details") => Some(FakeElement::Details),
            (Some(FakeElement::Details), "svgchart") => Some(FakeElement::Chart),
            _ => None,
        })
    }

    async fn find_by_tag(
        &self,
        scope: &FakeElement,
        tag: &str,
    ) -> Result<Option<FakeElement>, Error> {
        Ok(match (scope, tag) {
            (FakeElement::Chart, "svg") => Some(FakeElement::Svg),
            _ => None,
        })
    }

    async fn find_by_class(
        &self,
        scope: &FakeElement,
        class: &str,
    ) -> Result<Option<FakeElement>, Error> {
        Ok(match (scope, class) {
            (FakeElement::Bar(i), "g_rect") => Some(FakeElement::Rect(*i)),
            (FakeElement::Rect(i), "amount") => Some(FakeElement::Amount(*i)),
            _ => None,
        })
    }

    async fn find_all_by_class(
        &self,
        scope: &FakeElement,
        class: &str,
    ) -> Result<Vec<FakeElement>, Error> {
        Ok(match (scope, class) {
            (FakeElement::Svg, "barlink") => (0..self.bars().len()).map(FakeElement::Bar).collect(),
            _ => Vec::new(),
        })
    }

    async fn href(&self, element: &FakeElement) -> Result<Option<AnimatedHref>, Error> {
        Ok(match element {
            FakeElement::Bar(i) => self.bars().get(*i).map(|bar| AnimatedHref {
                anim_val: Some(bar.href.clone()),
                base_val: Some(bar.href.clone()),
            }),
            _ => None,
        })
    }

    async fn text(&self, element: &FakeElement) -> Result<String, Error> {
        match element {
            FakeElement::Amount(i) => Ok(self
                .bars()
                .get(*i)
                .map(|bar| bar.amount.clone())
                .unwrap_or_default()),
            other => Err(Error::WebDriver(format!("no text for {:?}", other))),
        }
    }

    async fn close(self) -> Result<(), Error> {
        Ok(())
    }
}
