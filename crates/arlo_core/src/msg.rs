use crate::effect::{ActionKind, AuditAction, PollKind, PollOutcome, RequestSeq};
use crate::model::{AuditStatusSnapshot, Ballot, Interpretation, JurisdictionFileStatus};
use crate::route::Route;
use crate::setup::SetupStage;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The view became active; triggers the first refresh.
    Mounted,
    /// The view was torn down; everything it started is cancelled.
    Unmounted,
    RefreshRequested,
    StatusLoaded {
        seq: RequestSeq,
        result: Result<AuditStatusSnapshot, String>,
    },
    JurisdictionFileLoaded(Result<JurisdictionFileStatus, String>),
    BoardBallotsLoaded(Result<Vec<Ballot>, String>),
    RouteChanged(Route),
    SetupStageSelected(SetupStage),
    /// Raw text of the sample size field.
    SampleSizeInput(String),
    SampleSizeSubmitted,
    ActionRequested(AuditAction),
    ActionFinished {
        action: ActionKind,
        result: Result<(), String>,
    },
    PollSettled {
        poll: PollKind,
        outcome: PollOutcome,
    },
    Entry(EntryMsg),
    NoticeDismissed,
    NoOp,
}

/// Ballot data-entry actions of an audit board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryMsg {
    SetInterpretation(Option<Interpretation>),
    SetChoice(Option<String>),
    SetComment(Option<String>),
    GoReview,
    Edit,
    Previous,
    /// Also used for "ballot not found, move on".
    Next,
    Submit,
}
