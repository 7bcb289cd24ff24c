//! Runtime configuration, read from `VPAP_*` environment variables.

use std::str::FromStr;
use std::time::Duration;

use vpap_client::{Browser, DEFAULT_BASE_URL};

use crate::record::DidNotRunPolicy;

/// Oldest election year whose races are collected.
pub const DEFAULT_MIN_YEAR: i32 = 2017;

/// The elections page lists at most this many races.
pub const DEFAULT_MAX_RACES: usize = 6;

/// Settings for page fetching and extraction.
#[derive(Clone, Debug)]
pub struct ResearchConfig {
    /// Site root used for every page and to resolve relative links.
    pub base_url: String,
    /// Pause after every page fetch.
    pub request_delay: Duration,
    /// Transport timeout for a single page fetch.
    pub request_timeout: Duration,
    /// Races older than this year are ignored.
    pub min_year: i32,
    /// How many heading/table pairs of the elections page are read.
    pub max_races: usize,
    /// What the full record does with races the candidate did not run in.
    pub did_not_run: DidNotRunPolicy,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_delay: Duration::from_secs(2),
            request_timeout: vpap_client::DEFAULT_TIMEOUT,
            min_year: DEFAULT_MIN_YEAR,
            max_races: DEFAULT_MAX_RACES,
            did_not_run: DidNotRunPolicy::Drop,
        }
    }
}

impl ResearchConfig {
    /// Defaults overridden by `VPAP_BASE_URL`, `VPAP_REQUEST_DELAY_MS`,
    /// `VPAP_REQUEST_TIMEOUT_SECS`, `VPAP_MIN_YEAR`, `VPAP_MAX_RACES` and
    /// `VPAP_DID_NOT_RUN` when set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_string("VPAP_BASE_URL", &defaults.base_url),
            request_delay: Duration::from_millis(env_u64("VPAP_REQUEST_DELAY_MS", 2000)),
            request_timeout: Duration::from_secs(env_u64("VPAP_REQUEST_TIMEOUT_SECS", 20)),
            min_year: env_parse("VPAP_MIN_YEAR", defaults.min_year),
            max_races: env_parse("VPAP_MAX_RACES", defaults.max_races),
            did_not_run: env_parse("VPAP_DID_NOT_RUN", defaults.did_not_run),
        }
    }
}

/// Settings for the scripted browser used for IE charts.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Address of a running WebDriver server.
    pub webdriver_url: String,
    pub browser: Browser,
    pub headless: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            browser: Browser::Firefox,
            headless: true,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `VPAP_WEBDRIVER_URL`, `VPAP_BROWSER` and
    /// `VPAP_HEADLESS` when set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            webdriver_url: env_string("VPAP_WEBDRIVER_URL", &defaults.webdriver_url),
            browser: env_parse("VPAP_BROWSER", defaults.browser),
            headless: env_parse("VPAP_HEADLESS", defaults.headless),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_parse(key, default)
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}
