use arlo_core::model::{AuditStatusSnapshot, Ballot, JurisdictionFileStatus};
use arlo_core::{ActionKind, PollKind, RequestSeq};
use thiserror::Error;

/// Non-success HTTP status. The response body is never read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status_text}")]
pub struct RequestError {
    pub status: u16,
    pub status_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    Decode(String),
    /// The server answered 2xx with an `errors` envelope.
    #[error("{}", .0.join("; "))]
    Rejected(Vec<String>),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("Timed out")]
    Timeout,
    #[error("poll cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StatusFetched {
        seq: RequestSeq,
        result: Result<AuditStatusSnapshot, ApiError>,
    },
    JurisdictionFileFetched(Result<JurisdictionFileStatus, ApiError>),
    BoardBallotsFetched(Result<Vec<Ballot>, ApiError>),
    ActionCompleted {
        action: ActionKind,
        result: Result<(), ApiError>,
    },
    PollSettled {
        poll: PollKind,
        result: Result<(), PollError>,
    },
}
