use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use vpap_lib::validation;
use vpap_lib::{
    PoliteClient, RenderedSession, ResearchConfig, Researcher, SessionConfig, WebDriverSession,
};

use crate::commands::{did_not_run_policy, open_session};
use crate::output::{
    print_json, print_summary_markdown, print_summary_table, write_report_files, BatchSummary,
    OutputFormat,
};

#[derive(Args)]
pub struct ResearchArgs {
    /// File with one candidate name per line
    #[arg(long)]
    pub candidates: PathBuf,

    /// Directory for basic.csv, full.csv and errors.csv
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Skip independent-expenditure charts (no browser needed)
    #[arg(long)]
    pub no_ie: bool,

    /// Cycles a candidate did not run in: drop or sentinel
    #[arg(long)]
    pub did_not_run: Option<String>,
}

pub async fn run(
    args: &ResearchArgs,
    config: ResearchConfig,
    session_config: &SessionConfig,
    format: &OutputFormat,
) -> Result<()> {
    let contents = std::fs::read_to_string(&args.candidates)
        .with_context(|| format!("reading {}", args.candidates.display()))?;
    let names = validation::parse_candidate_list(&contents)?;
    let policy = did_not_run_policy(args.did_not_run.as_deref(), config.did_not_run)?;

    eprintln!("Researching {} candidates", names.len());
    let pb = ProgressBar::new(names.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} {msg}")
            .unwrap(),
    );
    let on_done = |name: &str| {
        pb.set_message(name.to_string());
        pb.inc(1);
    };

    let pages = PoliteClient::new(&config);
    let report = if args.no_ie {
        let mut researcher = Researcher::<_, WebDriverSession>::new(pages, None, config);
        researcher.research_batch(&names, on_done).await
    } else {
        let mut session = open_session(session_config).await?;
        let report = Researcher::new(pages, Some(&mut session), config)
            .research_batch(&names, on_done)
            .await;
        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }
        report
    };
    pb.finish_and_clear();

    let files = write_report_files(&args.out_dir, &report, policy)?;
    let summary = BatchSummary::new(&report, &files);

    match format {
        OutputFormat::Table => print_summary_table(&summary),
        OutputFormat::Markdown => print_summary_markdown(&summary),
        OutputFormat::Json => print_json(&summary),
    }

    Ok(())
}
