mod commands;
mod output;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use vpap_lib::{ResearchConfig, SessionConfig};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "vpap")]
#[command(about = "Research Virginia candidates' election history on VPAP")]
struct Cli {
    /// Output format: table, markdown or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Site root (overrides VPAP_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// WebDriver server used for IE charts (overrides VPAP_WEBDRIVER_URL)
    #[arg(long, global = true)]
    webdriver_url: Option<String>,

    /// Pause after every page fetch, in milliseconds (overrides VPAP_REQUEST_DELAY_MS)
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Research every candidate in a file and write CSV reports
    Research(commands::research::ResearchArgs),
    /// Research a single candidate and print the record
    Lookup(commands::lookup::LookupArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vpap=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        "markdown" => OutputFormat::Markdown,
        _ => OutputFormat::Table,
    };

    let mut config = ResearchConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(ms) = cli.delay_ms {
        config.request_delay = Duration::from_millis(ms);
    }
    let mut session_config = SessionConfig::from_env();
    if let Some(url) = cli.webdriver_url {
        session_config.webdriver_url = url;
    }

    match &cli.command {
        Commands::Research(args) => {
            commands::research::run(args, config, &session_config, &format).await?
        }
        Commands::Lookup(args) => {
            commands::lookup::run(args, config, &session_config, &format).await?
        }
    }

    Ok(())
}
