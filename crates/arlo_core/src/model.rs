//! Wire model for the audit server's JSON responses.
//!
//! Field names follow the server's camelCase keys. Optional fields whose
//! presence drives screen transitions (`sampleSizeOptions`, `sampleSize`) are
//! kept as `Option` so "absent" and "null" both read as not yet computed.

use serde::{Deserialize, Deserializer, Serialize};

/// Full state of one audit, as returned by `GET /election/{id}/audit/status`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStatusSnapshot {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub risk_limit: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub random_seed: String,
    #[serde(default = "default_online")]
    pub online: bool,
    #[serde(default)]
    pub frozen_at: Option<String>,
    #[serde(default)]
    pub contests: Vec<Contest>,
    #[serde(default)]
    pub jurisdictions: Vec<Jurisdiction>,
    #[serde(default)]
    pub rounds: Vec<Round>,
    #[serde(default)]
    pub is_multi_jurisdiction: bool,
}

impl AuditStatusSnapshot {
    /// The first round, if sampling has been set up.
    pub fn first_round(&self) -> Option<&Round> {
        self.rounds.first()
    }

    pub fn jurisdiction(&self, id: &str) -> Option<&Jurisdiction> {
        self.jurisdictions.iter().find(|j| j.id == id)
    }
}

fn default_online() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub total_ballots_cast: Option<u64>,
    #[serde(default)]
    pub num_winners: Option<u32>,
    #[serde(default)]
    pub votes_allowed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size_options: Option<Vec<SampleSizeOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub num_votes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSizeOption {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub prob: Option<f64>,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub contests: Vec<RoundContest>,
}

/// Per-contest record within a round, mirroring the contest's sample fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundContest {
    pub id: String,
    #[serde(default)]
    pub sample_size_options: Option<Vec<SampleSizeOption>>,
    #[serde(default)]
    pub sample_size: Option<u64>,
    #[serde(default)]
    pub end_measurements: Option<EndMeasurements>,
    #[serde(default)]
    pub results: std::collections::BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndMeasurements {
    #[serde(default)]
    pub pvalue: Option<f64>,
    #[serde(default)]
    pub is_complete: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Jurisdiction {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub contests: Vec<String>,
    #[serde(default)]
    pub audit_boards: Vec<AuditBoard>,
    #[serde(default)]
    pub ballot_manifest: Option<BallotManifest>,
    #[serde(default)]
    pub batches: Vec<Batch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotManifest {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub num_ballots: Option<u64>,
    #[serde(default)]
    pub num_batches: Option<u64>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tabulator: Option<String>,
    #[serde(default)]
    pub num_ballots: Option<u64>,
    #[serde(default)]
    pub storage_location: Option<String>,
}

/// A team examining sampled ballots. The passphrase doubles as the board's
/// login credential and the key of its printed QR code.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditBoard {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub passphrase: String,
    #[serde(default)]
    pub members: Vec<AuditBoardMember>,
    #[serde(default)]
    pub current_round_status: AuditBoardRoundStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditBoardMember {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub affiliation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditBoardRoundStatus {
    #[serde(default)]
    pub num_sampled_ballots: u64,
    #[serde(default)]
    pub num_audited_ballots: u64,
}

/// Reference from a ballot to the board it is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditBoardRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BallotStatus {
    Audited,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ballot {
    pub position: u32,
    pub batch: Batch,
    #[serde(default)]
    pub ticket_number: Option<String>,
    #[serde(default)]
    pub status: Option<BallotStatus>,
    #[serde(default)]
    pub interpretations: Vec<BallotInterpretation>,
    #[serde(default)]
    pub audit_board: Option<AuditBoardRef>,
}

impl Ballot {
    pub fn key(&self) -> BallotKey {
        BallotKey {
            batch_id: self.batch.id.clone(),
            position: self.position,
        }
    }

    pub fn interpretation_for(&self, contest_id: &str) -> Option<&BallotInterpretation> {
        self.interpretations
            .iter()
            .find(|i| i.contest_id == contest_id)
    }
}

/// A ballot's identity within a jurisdiction: (batch id, position).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BallotKey {
    pub batch_id: String,
    pub position: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Interpretation {
    Vote,
    Blank,
    CantAgree,
}

/// One recorded judgment of voter intent for one ballot/contest pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotInterpretation {
    pub contest_id: String,
    pub interpretation: Option<Interpretation>,
    pub choice_id: Option<String>,
    pub comment: Option<String>,
}

impl BallotInterpretation {
    pub fn empty(contest_id: impl Into<String>) -> Self {
        Self {
            contest_id: contest_id.into(),
            interpretation: None,
            choice_id: None,
            comment: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileProcessingState {
    ReadyToProcess,
    Processing,
    Processed,
    Errored,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProcessing {
    pub status: FileProcessingState,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `GET /election/{id}/jurisdiction/file`. Both halves are null
/// until a file has been uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JurisdictionFileStatus {
    #[serde(default)]
    pub file: Option<FileInfo>,
    #[serde(default)]
    pub processing: Option<FileProcessing>,
}

impl JurisdictionFileStatus {
    pub fn state(&self) -> Option<FileProcessingState> {
        self.processing.as_ref().map(|p| p.status)
    }

    /// True once processing has stopped, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(
            self.state(),
            Some(FileProcessingState::Processed | FileProcessingState::Errored)
        )
    }
}

/// Response of `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthMeta {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub jurisdiction_id: Option<String>,
    #[serde(default)]
    pub round_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Unsigned(u64),
    Float(f64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<StringOrNumber> = Option::deserialize(deserializer)?;
    Ok(match value {
        None => String::new(),
        Some(StringOrNumber::String(s)) => s,
        Some(StringOrNumber::Unsigned(n)) => n.to_string(),
        Some(StringOrNumber::Float(f)) => f.to_string(),
    })
}
