use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::AuthMeta;

/// Which audit layout the client was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditFlow {
    #[default]
    Single,
    Multi,
}

/// Identity of the logged-in audit board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardIdentity {
    pub audit_board_id: String,
    pub name: String,
    pub jurisdiction_id: String,
    pub round_id: String,
}

/// Logged-in user kind. Closed: every variant maps to exactly one screen family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    AuditAdmin,
    JurisdictionAdmin,
    AuditBoard(BoardIdentity),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("internal invariant violated: unknown user type {0:?}")]
    UnknownRole(String),
    #[error("audit board session is missing {0}")]
    MissingBoardField(&'static str),
}

/// Immutable per-session inputs to the state machine, passed in explicitly
/// at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub election_id: String,
    pub role: Role,
    pub flow: AuditFlow,
    pub email: Option<String>,
}

impl SessionContext {
    pub fn new(election_id: impl Into<String>, role: Role, flow: AuditFlow) -> Self {
        Self {
            election_id: election_id.into(),
            role,
            flow,
            email: None,
        }
    }

    /// Resolves the role from the `type` tag of `/auth/me`.
    pub fn from_meta(
        meta: &AuthMeta,
        election_id: impl Into<String>,
        flow: AuditFlow,
    ) -> Result<Self, SessionError> {
        let kind = meta.kind.as_deref().ok_or(SessionError::NotLoggedIn)?;
        let role = match kind {
            "audit_admin" => Role::AuditAdmin,
            "jurisdiction_admin" => Role::JurisdictionAdmin,
            "audit_board" => Role::AuditBoard(BoardIdentity {
                audit_board_id: required(&meta.id, "id")?,
                name: meta.name.clone().unwrap_or_default(),
                jurisdiction_id: required(&meta.jurisdiction_id, "jurisdictionId")?,
                round_id: required(&meta.round_id, "roundId")?,
            }),
            other => return Err(SessionError::UnknownRole(other.to_string())),
        };
        Ok(Self {
            election_id: election_id.into(),
            role,
            flow,
            email: meta.email.clone(),
        })
    }

    pub fn board(&self) -> Option<&BoardIdentity> {
        match &self.role {
            Role::AuditBoard(board) => Some(board),
            Role::AuditAdmin | Role::JurisdictionAdmin => None,
        }
    }
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, SessionError> {
    value
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or(SessionError::MissingBoardField(field))
}
