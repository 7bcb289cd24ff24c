use anyhow::Result;
use clap::Args;
use vpap_lib::{
    PoliteClient, RenderedSession, ResearchConfig, Researcher, SessionConfig, WebDriverSession,
};

use crate::commands::{did_not_run_policy, open_session};
use crate::output::{print_json, print_record_markdown, print_record_table, OutputFormat};

#[derive(Args)]
pub struct LookupArgs {
    /// Candidate name, as typed into the site search
    pub name: String,

    /// Print the full record (subject's party, result and money per cycle)
    #[arg(long)]
    pub full: bool,

    /// Skip independent-expenditure charts (no browser needed)
    #[arg(long)]
    pub no_ie: bool,

    /// Cycles the candidate did not run in: drop or sentinel
    #[arg(long)]
    pub did_not_run: Option<String>,
}

pub async fn run(
    args: &LookupArgs,
    config: ResearchConfig,
    session_config: &SessionConfig,
    format: &OutputFormat,
) -> Result<()> {
    let policy = did_not_run_policy(args.did_not_run.as_deref(), config.did_not_run)?;
    let pages = PoliteClient::new(&config);

    let result = if args.no_ie {
        let mut researcher = Researcher::<_, WebDriverSession>::new(pages, None, config);
        researcher.research(&args.name).await
    } else {
        let mut session = open_session(session_config).await?;
        let record = Researcher::new(pages, Some(&mut session), config)
            .research(&args.name)
            .await;
        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }
        record
    };
    let record = result?;

    let flat = if args.full {
        record.full(policy)
    } else {
        record.basic()
    };

    match format {
        OutputFormat::Table => print_record_table(&flat),
        OutputFormat::Markdown => print_record_markdown(&flat),
        OutputFormat::Json => print_json(&flat),
    }

    Ok(())
}
