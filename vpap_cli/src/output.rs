use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use vpap_lib::{BatchReport, CandidateFailure, CanonicalRecord, DidNotRunPolicy};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Markdown,
}

#[derive(Tabled, Serialize)]
struct FieldRow {
    #[tabled(rename = "Field")]
    #[serde(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Tabled, Serialize)]
struct FailureRow {
    #[tabled(rename = "Candidate")]
    #[serde(rename = "Candidate")]
    candidate: String,
    #[tabled(rename = "Error")]
    #[serde(rename = "Error")]
    error: String,
}

/// Paths of the files written for one batch.
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub basic: PathBuf,
    pub full: PathBuf,
    pub errors: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub candidates: usize,
    pub researched: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub basic_csv: String,
    pub full_csv: String,
    pub errors_csv: String,
    pub failures: Vec<CandidateFailure>,
}

impl BatchSummary {
    pub fn new(report: &BatchReport, files: &ReportFiles) -> Self {
        Self {
            candidates: report.records.len() + report.failures.len(),
            researched: report.records.len(),
            failed: report.failures.len(),
            started_at: report.started_at,
            finished_at: report.finished_at,
            basic_csv: files.basic.display().to_string(),
            full_csv: files.full.display().to_string(),
            errors_csv: files.errors.display().to_string(),
            failures: report.failures.clone(),
        }
    }
}

// -- Row builders --

fn build_field_rows(record: &CanonicalRecord) -> Vec<FieldRow> {
    record
        .iter()
        .map(|(key, value)| FieldRow {
            field: key.clone(),
            value: value.to_string(),
        })
        .collect()
}

fn build_summary_rows(summary: &BatchSummary) -> Vec<FieldRow> {
    let elapsed = summary.finished_at - summary.started_at;
    [
        ("Candidates", summary.candidates.to_string()),
        ("Researched", summary.researched.to_string()),
        ("Failed", summary.failed.to_string()),
        ("Elapsed", format!("{}s", elapsed.num_seconds())),
        ("Basic records", summary.basic_csv.clone()),
        ("Full records", summary.full_csv.clone()),
        ("Errors", summary.errors_csv.clone()),
    ]
    .into_iter()
    .map(|(field, value)| FieldRow {
        field: field.to_string(),
        value,
    })
    .collect()
}

fn build_failure_rows(failures: &[CandidateFailure]) -> Vec<FailureRow> {
    failures
        .iter()
        .map(|f| FailureRow {
            candidate: f.candidate.clone(),
            error: f.error_message.clone(),
        })
        .collect()
}

// -- Printers --

pub fn print_record_table(record: &CanonicalRecord) {
    println!("{}", Table::new(build_field_rows(record)));
}

pub fn print_record_markdown(record: &CanonicalRecord) {
    let mut table = Table::new(build_field_rows(record));
    table.with(Style::markdown());
    println!("{}", table);
}

pub fn print_summary_table(summary: &BatchSummary) {
    println!("{}", Table::new(build_summary_rows(summary)));
    if !summary.failures.is_empty() {
        println!("{}", Table::new(build_failure_rows(&summary.failures)));
    }
}

pub fn print_summary_markdown(summary: &BatchSummary) {
    let mut table = Table::new(build_summary_rows(summary));
    table.with(Style::markdown());
    println!("{}", table);
    if !summary.failures.is_empty() {
        let mut failures = Table::new(build_failure_rows(&summary.failures));
        failures.with(Style::markdown());
        println!("\n{}", failures);
    }
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

// -- CSV export --

/// Writes records as CSV. The header is the sorted union of every record's
/// keys; a record without a column gets an empty cell.
pub fn write_records_csv<W: Write>(writer: W, records: &[CanonicalRecord]) -> Result<()> {
    let columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.keys().map(String::as_str))
        .collect();
    let mut wtr = csv::Writer::from_writer(writer);
    if columns.is_empty() {
        wtr.flush()?;
        return Ok(());
    }
    wtr.write_record(&columns)?;
    for record in records {
        wtr.write_record(
            columns
                .iter()
                .map(|c| record.get(*c).map(|v| v.to_string()).unwrap_or_default()),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_failures_csv<W: Write>(writer: W, failures: &[CandidateFailure]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["candidate", "error_message"])?;
    for failure in failures {
        wtr.write_record([failure.candidate.as_str(), failure.error_message.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `basic.csv`, `full.csv` and `errors.csv` into `out_dir`.
pub fn write_report_files(
    out_dir: &Path,
    report: &BatchReport,
    policy: DidNotRunPolicy,
) -> Result<ReportFiles> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let files = ReportFiles {
        basic: out_dir.join("basic.csv"),
        full: out_dir.join("full.csv"),
        errors: out_dir.join("errors.csv"),
    };

    write_records_csv(create(&files.basic)?, &report.basic_records())?;
    write_records_csv(create(&files.full)?, &report.full_records(policy))?;
    write_failures_csv(create(&files.errors)?, &report.failures)?;
    Ok(files)
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("creating {}", path.display()))
}
