//! Transport layer for vpap.org research: an HTML page client and a
//! WebDriver-backed browser session for client-rendered charts.

mod client;
mod errors;
mod query;
pub mod session;
mod user_agent;
pub mod webdriver;

pub use self::client::{absolute_url, Client, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use self::errors::Error;
pub use self::query::{NoQuery, Query, SearchQuery};
pub use self::session::{AnimatedHref, RenderedSession};
pub use self::webdriver::{Browser, ElementId, WebDriverSession};
