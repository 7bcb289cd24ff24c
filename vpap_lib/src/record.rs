//! Merging extractor output into flat per-candidate records.
//!
//! The typed [`CandidateRecord`] is the unit of work; [`CanonicalRecord`] is
//! its flattened, export-ready form with deterministic key order.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::bio::LegislativeBio;
use crate::coerce::IntOrText;
use crate::elections::ElectionCycle;
use crate::error::ResearchError;
use crate::profile::{CurrentElection, Profile};
use crate::rows::{RowFigures, RowRecord};
use crate::search::CandidateIdentity;

/// Value written in place of a cycle's derived fields under
/// [`DidNotRunPolicy::Sentinel`].
pub const DID_NOT_RUN: &str = "did not run";

/// A scalar cell of a flattened record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    /// CSV rendering: null is an empty cell.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(n) => write!(f, "{}", n),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Int(n.into())
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<IntOrText> for FieldValue {
    fn from(v: IntOrText) -> Self {
        match v {
            IntOrText::Int(n) => FieldValue::Int(n),
            IntOrText::Text(s) => FieldValue::Text(s),
        }
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// Flattened record: key → scalar, ordered by key.
pub type CanonicalRecord = BTreeMap<String, FieldValue>;

/// What the full record does with a cycle the candidate did not run in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DidNotRunPolicy {
    /// Remove every key of the cycle.
    #[default]
    Drop,
    /// Remove the cycle's raw keys and mark its derived keys [`DID_NOT_RUN`],
    /// so combined tables keep the same columns for every candidate.
    Sentinel,
}

impl FromStr for DidNotRunPolicy {
    type Err = ResearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(DidNotRunPolicy::Drop),
            "sentinel" => Ok(DidNotRunPolicy::Sentinel),
            other => Err(ResearchError::InvalidInput(format!(
                "unknown did-not-run policy '{}', expected drop or sentinel",
                other
            ))),
        }
    }
}

/// Everything extracted for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRecord {
    pub identity: CandidateIdentity,
    pub profile: Profile,
    pub elections: Vec<ElectionCycle>,
    pub bio: LegislativeBio,
}

impl CandidateRecord {
    /// All extracted fields, flattened.
    pub fn basic(&self) -> CanonicalRecord {
        let mut out = CanonicalRecord::new();

        let id = &self.identity;
        put(&mut out, "search_string", id.search_string.as_str());
        put(&mut out, "canonical_name", id.candidate_name.as_str());
        put(&mut out, "candidate_page_link", id.candidate_page_link.as_str());
        put(&mut out, "elections_page_link", id.elections_page_link.as_str());
        put(&mut out, "legislator_page_link", id.legislator_page_link.as_str());

        let profile = &self.profile;
        put(&mut out, "candidate_id", profile.candidate_id.as_str());
        put(&mut out, "name", profile.name.clone());
        put(&mut out, "summary", profile.summary.clone());
        put(&mut out, "has_ie", profile.has_ie);
        put(&mut out, "as_state_link", profile.as_state_link.clone());
        put(&mut out, "as_federal_link", profile.as_federal_link.clone());
        if let Some(election) = &profile.current_election {
            flatten_current_election(&mut out, election);
        }

        for cycle in self.distinct_cycles() {
            flatten_cycle(&mut out, cycle);
        }

        for (key, value) in &self.bio.attributes {
            put(&mut out, key, value.clone());
        }
        put(&mut out, "bio_member_since", self.bio.member_since.clone());
        put(&mut out, "bio_years_of_service", self.bio.years_of_service.clone());

        out
    }

    /// The basic record plus, per cycle, the subject's party, winner flag,
    /// incumbency and money raised. Cycles where no D/R row carries the
    /// subject's name are handled according to `policy`.
    pub fn full(&self, policy: DidNotRunPolicy) -> CanonicalRecord {
        let mut out = self.basic();
        let subject = self.subject();

        for cycle in self.distinct_cycles() {
            let prefix = cycle.key_prefix();
            match subject_row(cycle, subject) {
                Some(row) => {
                    put(&mut out, &format!("{}_candidate_party", prefix), row.party.clone());
                    put(&mut out, &format!("{}_is_winner", prefix), row.winner);
                    put(&mut out, &format!("{}_is_incumbent", prefix), row.incumbent);
                    put(&mut out, &format!("{}_raised", prefix), row.figures.money_raised());
                }
                None => {
                    let cycle_prefix = format!("{}_", prefix);
                    out.retain(|key, _| !key.starts_with(&cycle_prefix));
                    if policy == DidNotRunPolicy::Sentinel {
                        for field in ["candidate_party", "is_winner", "is_incumbent", "raised"] {
                            put(&mut out, &format!("{}_{}", prefix, field), DID_NOT_RUN);
                        }
                    }
                }
            }
        }
        out
    }
}

impl CandidateRecord {
    fn subject(&self) -> &str {
        self.identity.candidate_name.trim()
    }

    /// One cycle per `{year}_{chamber}` key prefix, in page order. When two
    /// races share a prefix, the first one the subject ran in is kept, or
    /// the first race if the subject ran in neither.
    fn distinct_cycles(&self) -> Vec<&ElectionCycle> {
        let subject = self.subject();
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut kept: Vec<&ElectionCycle> = Vec::new();
        for cycle in &self.elections {
            let prefix = cycle.key_prefix();
            let i = match slots.get(&prefix).copied() {
                Some(i) => i,
                None => {
                    slots.insert(prefix, kept.len());
                    kept.push(cycle);
                    continue;
                }
            };
            let current = kept[i];
            if subject_row(current, subject).is_none() && subject_row(cycle, subject).is_some() {
                tracing::debug!(
                    "Race {} replaces {} under {}",
                    cycle.race_name,
                    current.race_name,
                    prefix
                );
                kept[i] = cycle;
            } else {
                tracing::debug!(
                    "Ignoring race {}, {} already covers {}",
                    cycle.race_name,
                    current.race_name,
                    prefix
                );
            }
        }
        kept
    }
}

/// First D/R row, in table order, whose name is exactly the subject's.
fn subject_row<'a>(cycle: &'a ElectionCycle, subject: &str) -> Option<&'a RowRecord> {
    cycle
        .rows
        .iter()
        .find(|row| row.is_major_party() && row.name.as_deref().map(str::trim) == Some(subject))
}

fn put(out: &mut CanonicalRecord, key: &str, value: impl Into<FieldValue>) {
    out.insert(key.to_string(), value.into());
}

fn flatten_current_election(out: &mut CanonicalRecord, election: &CurrentElection) {
    put(out, "election_office", election.office.clone());
    put(out, "election_link", election.link.clone());
    put(out, "election_date", election.date.clone());
    for (slot, row) in [("candidate", &election.candidate), ("opponent", &election.opponent)] {
        if let Some(row) = row {
            for (field, value) in row_fields(row) {
                put(out, &format!("{}_{}", slot, field), value);
            }
        }
    }
}

fn flatten_cycle(out: &mut CanonicalRecord, cycle: &ElectionCycle) {
    let prefix = cycle.key_prefix();
    put(out, &format!("{}_election_name", prefix), cycle.race_name.as_str());
    put(out, &format!("{}_election_link", prefix), cycle.race_link.as_str());
    let (support, oppose) = cycle
        .ie
        .as_ref()
        .map_or((0.0, 0.0), |ie| (ie.support_amount, ie.oppose_amount));
    put(out, &format!("{}_ie_support", prefix), support);
    put(out, &format!("{}_ie_oppose", prefix), oppose);

    for row in &cycle.rows {
        let Some(party) = row.party.as_deref() else {
            continue;
        };
        for (field, value) in row_fields(row) {
            put(out, &format!("{}_{}_{}", prefix, field, party), value);
        }
    }
}

/// Row fields under their flattened names, in a fixed order.
fn row_fields(row: &RowRecord) -> Vec<(&'static str, FieldValue)> {
    let mut fields = vec![
        ("name", FieldValue::from(row.name.clone())),
        ("party", row.party.clone().into()),
        ("incumbency", row.incumbent.into()),
        ("winner", row.winner.into()),
    ];
    match &row.figures {
        RowFigures::Fundraising {
            money_raised_text,
            money_raised,
        } => {
            fields.push(("money_raised_text", money_raised_text.clone().into()));
            fields.push(("money_raised", (*money_raised).into()));
        }
        RowFigures::CurrentElection {
            spent_text,
            spent,
            votes_text,
            votes,
            voteshare_text,
            voteshare,
        } => {
            fields.push(("spent_text", spent_text.clone().into()));
            fields.push(("spent", (*spent).into()));
            fields.push(("votes_text", votes_text.clone().into()));
            fields.push(("votes", votes.clone().into()));
            fields.push(("voteshare_text", voteshare_text.clone().into()));
            fields.push(("voteshare", (*voteshare).into()));
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elections::Chamber;
    use crate::ie::IeAmounts;

    fn row(name: &str, party: &str, winner: bool, raised: f64) -> RowRecord {
        RowRecord {
            name: Some(name.to_string()),
            party: Some(party.to_string()),
            incumbent: Some(false),
            winner: Some(winner),
            figures: RowFigures::Fundraising {
                money_raised_text: Some(format!("${}", raised)),
                money_raised: Some(raised),
            },
        }
    }

    fn cycle(year: i32, chamber: Chamber, rows: Vec<RowRecord>) -> ElectionCycle {
        ElectionCycle {
            year,
            chamber,
            race_name: format!("{} General", year),
            race_link: format!("https://www.vpap.org/elections/{}/", year),
            rows,
            ie: None,
        }
    }

    fn jane_doe(elections: Vec<ElectionCycle>) -> CandidateRecord {
        CandidateRecord {
            identity: CandidateIdentity {
                search_string: "Jane Doe".into(),
                candidate_name: "Doe, Jane".into(),
                candidate_page_link: "https://www.vpap.org/candidates/1234/".into(),
                elections_page_link: "https://www.vpap.org/candidates/1234/elections/".into(),
                legislator_page_link: "https://www.vpap.org/legislators/1234/".into(),
            },
            profile: Profile {
                candidate_id: "1234".into(),
                name: Some("Jane Doe".into()),
                summary: Some("Delegate".into()),
                has_ie: Some(false),
                as_state_link: None,
                as_federal_link: None,
                current_election: None,
            },
            elections,
            bio: LegislativeBio::default(),
        }
    }

    #[test]
    fn basic_record_flattens_every_source() {
        let mut lower = cycle(
            2019,
            Chamber::Lower,
            vec![row("Doe, Jane", "R", true, 120000.0), row("Roe, Richard", "D", false, 80000.0)],
        );
        lower.ie = Some(IeAmounts {
            support_amount_text: "$12,345".into(),
            support_amount: 12345.0,
            ..IeAmounts::default()
        });
        let basic = jane_doe(vec![lower]).basic();

        assert_eq!(basic["candidate_id"], FieldValue::Text("1234".into()));
        assert_eq!(basic["has_ie"], FieldValue::Bool(false));
        assert_eq!(basic["as_federal_link"], FieldValue::Null);
        assert_eq!(basic["2019_lower_election_name"], FieldValue::Text("2019 General".into()));
        assert_eq!(basic["2019_lower_ie_support"], FieldValue::Float(12345.0));
        assert_eq!(basic["2019_lower_ie_oppose"], FieldValue::Float(0.0));
        assert_eq!(basic["2019_lower_name_R"], FieldValue::Text("Doe, Jane".into()));
        assert_eq!(basic["2019_lower_money_raised_D"], FieldValue::Float(80000.0));
        assert_eq!(basic["2019_lower_winner_R"], FieldValue::Bool(true));
        assert_eq!(basic["2019_lower_incumbency_D"], FieldValue::Bool(false));
        assert!(!basic.contains_key("election_office"));
        assert!(!basic.contains_key("2019_lower_candidate_party"));
    }

    #[test]
    fn empty_bio_keeps_null_service_fields() {
        let basic = jane_doe(vec![]).basic();
        assert_eq!(basic["bio_member_since"], FieldValue::Null);
        assert_eq!(basic["bio_years_of_service"], FieldValue::Null);
        assert!(!basic.keys().any(|k| k.starts_with("bio_") && k != "bio_member_since" && k != "bio_years_of_service"));
    }

    #[test]
    fn bio_attributes_are_flattened() {
        let mut record = jane_doe(vec![]);
        record
            .bio
            .attributes
            .insert("bio_party_caucus".into(), Some("Republican".into()));
        record.bio.member_since = Some(IntOrText::Int(2014));
        let basic = record.basic();
        assert_eq!(basic["bio_party_caucus"], FieldValue::Text("Republican".into()));
        assert_eq!(basic["bio_member_since"], FieldValue::Int(2014));
        assert_eq!(basic["bio_years_of_service"], FieldValue::Null);
    }

    #[test]
    fn current_election_slots_are_prefixed() {
        let mut record = jane_doe(vec![]);
        record.profile.current_election = Some(CurrentElection {
            office: Some("House of Delegates 12th".into()),
            link: Some("/elections/2023/hod-12/".into()),
            date: None,
            candidate: Some(RowRecord {
                name: Some("Doe, Jane M.".into()),
                party: Some("R".into()),
                incumbent: Some(true),
                winner: Some(true),
                figures: RowFigures::CurrentElection {
                    spent_text: Some("$45,000".into()),
                    spent: Some(45000.0),
                    votes_text: Some("12,345".into()),
                    votes: Some(IntOrText::Int(12345)),
                    voteshare_text: Some("54.3%".into()),
                    voteshare: Some(54.3),
                },
            }),
            opponent: None,
        });
        let basic = record.basic();
        assert_eq!(basic["election_office"], FieldValue::Text("House of Delegates 12th".into()));
        assert_eq!(basic["election_date"], FieldValue::Null);
        assert_eq!(basic["candidate_votes"], FieldValue::Int(12345));
        assert_eq!(basic["candidate_voteshare"], FieldValue::Float(54.3));
        assert_eq!(basic["candidate_incumbency"], FieldValue::Bool(true));
        assert!(!basic.contains_key("opponent_name"));
        assert_eq!(basic["candidate_name"], FieldValue::Text("Doe, Jane M.".into()));
        assert_eq!(basic["canonical_name"], FieldValue::Text("Doe, Jane".into()));
    }

    #[test]
    fn full_record_derives_subject_fields() {
        let record = jane_doe(vec![cycle(
            2019,
            Chamber::Lower,
            vec![row("Roe, Richard", "D", false, 80000.0), row("Doe, Jane", "R", true, 120000.0)],
        )]);
        let full = record.full(DidNotRunPolicy::Drop);
        assert_eq!(full["2019_lower_candidate_party"], FieldValue::Text("R".into()));
        assert_eq!(full["2019_lower_is_winner"], FieldValue::Bool(true));
        assert_eq!(full["2019_lower_is_incumbent"], FieldValue::Bool(false));
        assert_eq!(full["2019_lower_raised"], FieldValue::Float(120000.0));
        assert_eq!(full["2019_lower_name_D"], FieldValue::Text("Roe, Richard".into()));
    }

    #[test]
    fn cycle_without_subject_is_dropped_from_full_only() {
        let record = jane_doe(vec![
            cycle(2019, Chamber::Lower, vec![row("Doe, Jane", "R", true, 1.0)]),
            cycle(2021, Chamber::Upper, vec![row("Someone, Else", "D", true, 2.0)]),
        ]);
        let basic = record.basic();
        let full = record.full(DidNotRunPolicy::Drop);

        assert!(basic.contains_key("2021_upper_name_D"));
        assert!(basic.contains_key("2021_upper_election_name"));
        assert!(!full.keys().any(|k| k.starts_with("2021_upper_")));
        assert!(full.contains_key("2019_lower_candidate_party"));
    }

    #[test]
    fn sentinel_policy_marks_derived_fields() {
        let record = jane_doe(vec![cycle(
            2021,
            Chamber::Upper,
            vec![row("Someone, Else", "D", true, 2.0)],
        )]);
        let full = record.full(DidNotRunPolicy::Sentinel);
        let cycle_keys: Vec<&String> = full.keys().filter(|k| k.starts_with("2021_upper_")).collect();
        assert_eq!(cycle_keys.len(), 4);
        assert_eq!(
            full["2021_upper_candidate_party"],
            FieldValue::Text(DID_NOT_RUN.into())
        );
        assert_eq!(full["2021_upper_raised"], FieldValue::Text(DID_NOT_RUN.into()));
    }

    #[test]
    fn first_matching_row_wins() {
        let record = jane_doe(vec![cycle(
            2019,
            Chamber::Lower,
            vec![row("Doe, Jane", "D", false, 1.0), row("Doe, Jane", "R", true, 2.0)],
        )]);
        let full = record.full(DidNotRunPolicy::Drop);
        assert_eq!(full["2019_lower_candidate_party"], FieldValue::Text("D".into()));
        assert_eq!(full["2019_lower_raised"], FieldValue::Float(1.0));
    }

    #[test]
    fn reconciling_twice_is_identical() {
        let record = jane_doe(vec![
            cycle(2019, Chamber::Lower, vec![row("Doe, Jane", "R", true, 1.0)]),
            cycle(2021, Chamber::Other, vec![]),
        ]);
        assert_eq!(record.basic(), record.basic());
        assert_eq!(
            record.full(DidNotRunPolicy::Sentinel),
            record.clone().full(DidNotRunPolicy::Sentinel)
        );
    }

    fn race(year: i32, name: &str, rows: Vec<RowRecord>) -> ElectionCycle {
        ElectionCycle {
            race_name: name.to_string(),
            race_link: format!(
                "https://www.vpap.org/elections/{}/{}/",
                year,
                name.to_lowercase().replace(' ', "-")
            ),
            ..cycle(year, Chamber::Other, rows)
        }
    }

    #[test]
    fn shared_prefix_keeps_the_race_the_subject_ran_in() {
        let record = jane_doe(vec![
            race(2021, "City Council", vec![row("Other, Al", "D", true, 5.0)]),
            race(2021, "Board of Supervisors", vec![row("Doe, Jane", "R", true, 7.0)]),
        ]);

        let basic = record.basic();
        assert_eq!(
            basic["2021_other_election_name"],
            FieldValue::Text("Board of Supervisors".into())
        );
        assert!(!basic.contains_key("2021_other_name_D"));

        let full = record.full(DidNotRunPolicy::Drop);
        assert_eq!(full["2021_other_name_R"], FieldValue::Text("Doe, Jane".into()));
        assert_eq!(full["2021_other_money_raised_R"], FieldValue::Float(7.0));
        assert_eq!(full["2021_other_candidate_party"], FieldValue::Text("R".into()));
        assert_eq!(full["2021_other_raised"], FieldValue::Float(7.0));
    }

    #[test]
    fn shared_prefix_without_subject_keeps_first_race() {
        let record = jane_doe(vec![
            race(2021, "City Council", vec![row("Other, Al", "D", true, 5.0)]),
            race(2021, "School Board", vec![row("Someone, Else", "R", true, 6.0)]),
        ]);
        let basic = record.basic();
        assert_eq!(basic["2021_other_election_name"], FieldValue::Text("City Council".into()));
        assert!(!basic.contains_key("2021_other_name_R"));

        let full = record.full(DidNotRunPolicy::Drop);
        assert!(!full.keys().any(|k| k.starts_with("2021_other_")));
    }

    #[test]
    fn field_values_render_for_csv_and_json() {
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(FieldValue::Float(12345.0).to_string(), "12345");
        assert_eq!(FieldValue::Bool(true).to_string(), "true");
        assert_eq!(serde_json::to_string(&FieldValue::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&FieldValue::Int(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&FieldValue::from("R")).unwrap(), "\"R\"");
    }

    #[test]
    fn policy_parses() {
        assert_eq!("drop".parse::<DidNotRunPolicy>().unwrap(), DidNotRunPolicy::Drop);
        assert_eq!(" Sentinel ".parse::<DidNotRunPolicy>().unwrap(), DidNotRunPolicy::Sentinel);
        assert!("keep".parse::<DidNotRunPolicy>().is_err());
    }
}
