//! CLI subcommand implementations.

pub mod lookup;
pub mod research;

use anyhow::{Context, Result};
use vpap_lib::{DidNotRunPolicy, SessionConfig, WebDriverSession};

/// Opens the browser session used for IE charts.
pub async fn open_session(config: &SessionConfig) -> Result<WebDriverSession> {
    WebDriverSession::start(&config.webdriver_url, config.browser, config.headless)
        .await
        .with_context(|| {
            format!(
                "could not start a {} session at {} (use --no-ie to skip IE charts)",
                config.browser, config.webdriver_url
            )
        })
}

/// `--did-not-run` flag value, falling back to the configured policy.
pub fn did_not_run_policy(flag: Option<&str>, configured: DidNotRunPolicy) -> Result<DidNotRunPolicy> {
    match flag {
        Some(value) => Ok(value.parse()?),
        None => Ok(configured),
    }
}
