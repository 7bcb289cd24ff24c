//! Per-candidate pipeline and the batch loop around it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use vpap_client::RenderedSession;

use crate::bio::extract_bio;
use crate::config::ResearchConfig;
use crate::elections::extract_elections;
use crate::error::ResearchError;
use crate::fetch::PageSource;
use crate::profile::extract_profile;
use crate::record::{CandidateRecord, CanonicalRecord, DidNotRunPolicy};
use crate::search::disambiguate;
use crate::validation::validate_candidate_name;

/// A candidate whose research failed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateFailure {
    pub candidate: String,
    pub error_message: String,
}

/// Outcome of a batch: every candidate ends up in exactly one of the two lists.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub records: Vec<CandidateRecord>,
    pub failures: Vec<CandidateFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn basic_records(&self) -> Vec<CanonicalRecord> {
        self.records.iter().map(CandidateRecord::basic).collect()
    }

    pub fn full_records(&self, policy: DidNotRunPolicy) -> Vec<CanonicalRecord> {
        self.records.iter().map(|r| r.full(policy)).collect()
    }
}

/// Runs the extractors for one candidate at a time.
///
/// The browser session is optional; without it IE amounts are not looked up.
/// The session is borrowed, so whoever opened it closes it after the batch.
pub struct Researcher<'s, P, S> {
    pages: P,
    session: Option<&'s mut S>,
    config: ResearchConfig,
}

impl<'s, P, S> Researcher<'s, P, S>
where
    P: PageSource,
    S: RenderedSession,
{
    pub fn new(pages: P, session: Option<&'s mut S>, config: ResearchConfig) -> Self {
        Self {
            pages,
            session,
            config,
        }
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Search, profile, election history (with IE), then bio.
    pub async fn research(&mut self, name: &str) -> Result<CandidateRecord, ResearchError> {
        let name = validate_candidate_name(name)?;
        let identity = disambiguate(&self.pages, &name).await?;
        tracing::debug!(
            "Resolved {:?} to {}",
            name,
            identity.candidate_page_link
        );

        let profile = extract_profile(&self.pages, &identity).await?;
        let elections = extract_elections(
            &self.pages,
            &identity.elections_page_link,
            &profile,
            self.session.as_deref_mut(),
            &self.config,
        )
        .await?;
        let bio = extract_bio(&self.pages, &identity.legislator_page_link).await?;

        Ok(CandidateRecord {
            identity,
            profile,
            elections,
            bio,
        })
    }

    /// Researches every name in order. A failure is recorded and the batch
    /// moves on. `on_done` is called after each candidate.
    pub async fn research_batch<F>(&mut self, names: &[String], mut on_done: F) -> BatchReport
    where
        F: FnMut(&str),
    {
        let started_at = Utc::now();
        let mut records = Vec::new();
        let mut failures = Vec::new();

        for name in names {
            match self.research(name).await {
                Ok(record) => {
                    tracing::info!(
                        "Researched {} ({} election cycles)",
                        record.identity.candidate_name,
                        record.elections.len()
                    );
                    records.push(record);
                }
                Err(e) => {
                    tracing::warn!("Research failed for {}: {}", name, e);
                    failures.push(CandidateFailure {
                        candidate: name.clone(),
                        error_message: e.to_string(),
                    });
                }
            }
            on_done(name);
        }

        BatchReport {
            records,
            failures,
            started_at,
            finished_at: Utc::now(),
        }
    }
}
