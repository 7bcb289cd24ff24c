//! Minimal W3C WebDriver client implementing [`RenderedSession`].
//!
//! Speaks the JSON wire protocol of a running driver (geckodriver,
//! chromedriver or a Selenium server). Only the handful of commands needed to
//! load a page and read chart elements are implemented.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::session::{AnimatedHref, RenderedSession};
use crate::Error;

/// Key under which WebDriver serializes element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Page loads of chart-heavy race pages can be slow.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

const HREF_SCRIPT: &str = "var h = arguments[0].href; \
    if (h === undefined || h === null) { return null; } \
    if (typeof h === 'string') { return {animVal: h, baseVal: h}; } \
    return {animVal: h.animVal, baseVal: h.baseVal};";

/// Browser requested from the driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Firefox,
    Chrome,
}

impl FromStr for Browser {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "firefox" | "gecko" => Ok(Browser::Firefox),
            "chrome" | "chromium" => Ok(Browser::Chrome),
            other => Err(Error::WebDriver(format!("unsupported browser '{}'", other))),
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Browser::Firefox => write!(f, "firefox"),
            Browser::Chrome => write!(f, "chrome"),
        }
    }
}

/// Opaque WebDriver element reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementId(String);

impl ElementId {
    fn from_value(value: &Value) -> Result<Self, Error> {
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| ElementId(id.to_string()))
            .ok_or_else(|| Error::WebDriver(format!("malformed element reference: {}", value)))
    }

    fn to_value(&self) -> Value {
        json!({ ELEMENT_KEY: self.0 })
    }
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    value: Value,
}

enum Reply {
    Value(Value),
    NoSuchElement,
}

/// A browser session held open on a WebDriver server.
pub struct WebDriverSession {
    http: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl WebDriverSession {
    /// Opens a new browser session on the driver listening at `webdriver_url`.
    pub async fn start(webdriver_url: &str, browser: Browser, headless: bool) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(COMMAND_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build WebDriver HTTP client: {}", e);
                Error::RequestFailed
            })?;
        let base_url = webdriver_url.trim_end_matches('/').to_string();

        let capabilities = capabilities(browser, headless);
        let reply = send(
            http.post(format!("{}/session", base_url))
                .json(&json!({ "capabilities": { "alwaysMatch": capabilities } })),
        )
        .await?;
        let value = match reply {
            Reply::Value(value) => value,
            Reply::NoSuchElement => {
                return Err(Error::WebDriver("unexpected reply to new session".into()))
            }
        };
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::WebDriver("new session reply has no sessionId".into()))?
            .to_string();
        tracing::info!("Started {} WebDriver session {}", browser, session_id);

        Ok(Self {
            http,
            base_url,
            session_id,
        })
    }

    /// Server-assigned session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn session_url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base_url, self.session_id, path)
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Reply, Error> {
        let mut req = self.http.request(method, self.session_url(path));
        if let Some(body) = body {
            req = req.json(&body);
        }
        send(req).await
    }

    async fn value(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, Error> {
        match self.command(method, path, body).await? {
            Reply::Value(value) => Ok(value),
            Reply::NoSuchElement => Err(Error::WebDriver(format!("no such element for {}", path))),
        }
    }

    async fn find_one(
        &self,
        scope: Option<&ElementId>,
        css: &str,
    ) -> Result<Option<ElementId>, Error> {
        let path = match scope {
            Some(scope) => format!("/element/{}/element", scope.0),
            None => "/element".to_string(),
        };
        let body = json!({ "using": "css selector", "value": css });
        match self.command(Method::POST, &path, Some(body)).await? {
            Reply::Value(value) => ElementId::from_value(&value).map(Some),
            Reply::NoSuchElement => Ok(None),
        }
    }

    async fn find_many(&self, scope: &ElementId, css: &str) -> Result<Vec<ElementId>, Error> {
        let path = format!("/element/{}/elements", scope.0);
        let body = json!({ "using": "css selector", "value": css });
        match self.command(Method::POST, &path, Some(body)).await? {
            Reply::Value(Value::Array(items)) => items.iter().map(ElementId::from_value).collect(),
            Reply::Value(other) => Err(Error::WebDriver(format!(
                "expected element list, got {}",
                other
            ))),
            Reply::NoSuchElement => Ok(Vec::new()),
        }
    }
}

impl RenderedSession for WebDriverSession {
    type Element = ElementId;

    async fn navigate(&mut self, url: &str) -> Result<(), Error> {
        tracing::debug!("Navigating browser to {}", url);
        self.value(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn find_by_id(
        &self,
        scope: Option<&ElementId>,
        id: &str,
    ) -> Result<Option<ElementId>, Error> {
        self.find_one(scope, &format!("[id=\"{}\"]", id)).await
    }

    async fn find_by_tag(&self, scope: &ElementId, tag: &str) -> Result<Option<ElementId>, Error> {
        self.find_one(Some(scope), tag).await
    }

    async fn find_by_class(
        &self,
        scope: &ElementId,
        class: &str,
    ) -> Result<Option<ElementId>, Error> {
        self.find_one(Some(scope), &format!(".{}", class)).await
    }

    async fn find_all_by_class(&self, scope: &ElementId, class: &str) -> Result<Vec<ElementId>, Error> {
        self.find_many(scope, &format!(".{}", class)).await
    }

    async fn href(&self, element: &ElementId) -> Result<Option<AnimatedHref>, Error> {
        let body = json!({ "script": HREF_SCRIPT, "args": [element.to_value()] });
        let value = self.value(Method::POST, "/execute/sync", Some(body)).await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| Error::WebDriver(format!("malformed href payload: {}", e)))
    }

    async fn text(&self, element: &ElementId) -> Result<String, Error> {
        let path = format!("/element/{}/text", element.0);
        let value = self.value(Method::GET, &path, None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn close(self) -> Result<(), Error> {
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        send(self.http.delete(url)).await?;
        tracing::info!("Closed WebDriver session {}", self.session_id);
        Ok(())
    }
}

fn capabilities(browser: Browser, headless: bool) -> Value {
    match browser {
        Browser::Firefox => {
            let args: Vec<&str> = if headless { vec!["-headless"] } else { vec![] };
            json!({ "browserName": "firefox", "moz:firefoxOptions": { "args": args } })
        }
        Browser::Chrome => {
            let args: Vec<&str> = if headless { vec!["--headless=new"] } else { vec![] };
            json!({ "browserName": "chrome", "goog:chromeOptions": { "args": args } })
        }
    }
}

async fn send(req: reqwest::RequestBuilder) -> Result<Reply, Error> {
    let resp = req.send().await.map_err(|e| {
        tracing::error!("WebDriver request failed: {}", e);
        Error::RequestFailed
    })?;
    let status = resp.status();
    let body: WireResponse = resp.json().await.map_err(|e| {
        tracing::error!("Failed to read WebDriver reply: {}", e);
        Error::RequestFailed
    })?;

    if status.is_success() {
        return Ok(Reply::Value(body.value));
    }

    let code = body
        .value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    if code == "no such element" {
        return Ok(Reply::NoSuchElement);
    }
    let message = body
        .value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Err(Error::WebDriver(format!("{} (HTTP {}): {}", code, status.as_u16(), message)))
}
