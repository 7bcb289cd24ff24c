//! Research layer for vpap: turns a candidate name into a flat record of
//! candidacies, election results, fundraising and independent expenditures.
//!
//! Pages come from `vpap_client`; this crate owns extraction, value coercion,
//! record reconciliation and the batch loop.

pub mod bio;
pub mod coerce;
pub mod config;
pub mod elections;
pub mod error;
pub mod fetch;
pub mod ie;
pub mod profile;
pub mod record;
pub mod research;
pub mod rows;
pub mod search;
pub mod validation;

pub use vpap_client;
pub use vpap_client::{Browser, RenderedSession, WebDriverSession};

pub use bio::LegislativeBio;
pub use config::{ResearchConfig, SessionConfig};
pub use elections::{Chamber, ElectionCycle};
pub use error::ResearchError;
pub use fetch::{PageSource, PoliteClient};
pub use ie::IeAmounts;
pub use profile::{CurrentElection, Profile};
pub use record::{CandidateRecord, CanonicalRecord, DidNotRunPolicy, FieldValue};
pub use research::{BatchReport, CandidateFailure, Researcher};
pub use rows::{RowFigures, RowRecord, RowShape};
pub use search::CandidateIdentity;
