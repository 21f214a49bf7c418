use serde::Serialize;

use crate::model::{AuditStatusSnapshot, BallotInterpretation, BallotKey, Contest};
use crate::screen::{show_calculate_risk_measurement, show_select_ballots_to_audit};

/// Monotonic id of a status fetch. Responses older than the latest issued
/// fetch are dropped.
pub type RequestSeq = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchStatus { seq: RequestSeq },
    FetchJurisdictionFile,
    FetchBoardBallots {
        jurisdiction_id: String,
        round_id: String,
        audit_board_id: String,
    },
    RunAction(AuditAction),
    StartPoll(PollKind),
    /// Cancel every poll and in-flight request owned by this view.
    CancelAll,
    Navigate(String),
}

/// Condition on the audit status that a post-action poll waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusTarget {
    SampleSizeOptionsReady,
    SampleSizesSelected,
}

impl StatusTarget {
    pub fn is_reached(self, snapshot: &AuditStatusSnapshot) -> bool {
        match self {
            StatusTarget::SampleSizeOptionsReady => show_select_ballots_to_audit(snapshot),
            StatusTarget::SampleSizesSelected => show_calculate_risk_measurement(snapshot),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PollKind {
    Status(StatusTarget),
    /// Until the jurisdictions file has finished processing.
    JurisdictionFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Done,
    TimedOut,
}

/// A state-mutating request to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditAction {
    ResetAudit,
    SubmitAuditBasics(AuditBasics),
    SubmitSampleSize { size: u64 },
    UploadJurisdictionsFile(Upload),
    UploadManifest {
        jurisdiction_id: String,
        file: Upload,
    },
    SubmitInterpretation {
        jurisdiction_id: String,
        key: BallotKey,
        interpretations: Vec<BallotInterpretation>,
    },
}

impl AuditAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            AuditAction::ResetAudit => ActionKind::ResetAudit,
            AuditAction::SubmitAuditBasics(_) => ActionKind::SubmitAuditBasics,
            AuditAction::SubmitSampleSize { .. } => ActionKind::SubmitSampleSize,
            AuditAction::UploadJurisdictionsFile(_) => ActionKind::UploadJurisdictionsFile,
            AuditAction::UploadManifest { .. } => ActionKind::UploadManifest,
            AuditAction::SubmitInterpretation { .. } => ActionKind::SubmitInterpretation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    ResetAudit,
    SubmitAuditBasics,
    SubmitSampleSize,
    UploadJurisdictionsFile,
    UploadManifest,
    SubmitInterpretation,
}

impl ActionKind {
    /// Server job to observe once the action has been accepted.
    pub fn follow_up_poll(self) -> Option<PollKind> {
        match self {
            ActionKind::SubmitAuditBasics => {
                Some(PollKind::Status(StatusTarget::SampleSizeOptionsReady))
            }
            ActionKind::SubmitSampleSize => Some(PollKind::Status(StatusTarget::SampleSizesSelected)),
            ActionKind::ResetAudit
            | ActionKind::UploadJurisdictionsFile
            | ActionKind::UploadManifest
            | ActionKind::SubmitInterpretation => None,
        }
    }
}

/// Body of `POST /audit/basic`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditBasics {
    pub name: String,
    pub risk_limit: u32,
    pub random_seed: String,
    pub online: bool,
    pub contests: Vec<Contest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub contents: Vec<u8>,
}
