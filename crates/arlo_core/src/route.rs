use thiserror::Error;
use url::Url;

use crate::model::BallotKey;

/// The optional view segment of `/election/{id}/{view?}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ElectionView {
    #[default]
    Overview,
    Setup,
    Progress,
    /// Any other segment; treated like `Overview` by screen selection.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Root,
    Election {
        election_id: String,
        view: ElectionView,
    },
    BoardHome {
        election_id: String,
        audit_board_id: String,
    },
    BallotEntry {
        election_id: String,
        audit_board_id: String,
        key: BallotKey,
    },
    /// Credential-driven entry point printed on audit board sheets.
    AuditBoardLogin { passphrase: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unrecognized route: {0}")]
    Unrecognized(String),
    #[error("invalid ballot position: {0}")]
    InvalidPosition(String),
}

impl Route {
    pub fn election(election_id: impl Into<String>) -> Self {
        Route::Election {
            election_id: election_id.into(),
            view: ElectionView::Overview,
        }
    }

    /// Parses an absolute URL or a bare path.
    pub fn parse(input: &str) -> Result<Self, RouteError> {
        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://localhost")
                .and_then(|base| base.join(input))
                .map_err(|err| RouteError::InvalidUrl(err.to_string()))?,
            Err(err) => return Err(RouteError::InvalidUrl(err.to_string())),
        };
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [] => Ok(Route::Root),
            ["auditboard", passphrase] => Ok(Route::AuditBoardLogin {
                passphrase: (*passphrase).to_string(),
            }),
            ["election", election_id] => Ok(Route::election(*election_id)),
            ["election", election_id, "board", board_id] => Ok(Route::BoardHome {
                election_id: (*election_id).to_string(),
                audit_board_id: (*board_id).to_string(),
            }),
            ["election", election_id, "board", board_id, "batch", batch_id, "ballot", position] => {
                let position = position
                    .parse::<u32>()
                    .map_err(|_| RouteError::InvalidPosition((*position).to_string()))?;
                Ok(Route::BallotEntry {
                    election_id: (*election_id).to_string(),
                    audit_board_id: (*board_id).to_string(),
                    key: BallotKey {
                        batch_id: (*batch_id).to_string(),
                        position,
                    },
                })
            }
            ["election", election_id, view] => Ok(Route::Election {
                election_id: (*election_id).to_string(),
                view: match *view {
                    "setup" => ElectionView::Setup,
                    "progress" => ElectionView::Progress,
                    other => ElectionView::Other(other.to_string()),
                },
            }),
            _ => Err(RouteError::Unrecognized(url.path().to_string())),
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::Root => "/".to_string(),
            Route::Election { election_id, view } => match view {
                ElectionView::Overview => format!("/election/{election_id}"),
                ElectionView::Setup => format!("/election/{election_id}/setup"),
                ElectionView::Progress => format!("/election/{election_id}/progress"),
                ElectionView::Other(segment) => format!("/election/{election_id}/{segment}"),
            },
            Route::BoardHome {
                election_id,
                audit_board_id,
            } => format!("/election/{election_id}/board/{audit_board_id}"),
            Route::BallotEntry {
                election_id,
                audit_board_id,
                key,
            } => format!(
                "/election/{election_id}/board/{audit_board_id}/batch/{}/ballot/{}",
                key.batch_id, key.position
            ),
            Route::AuditBoardLogin { passphrase } => format!("/auditboard/{passphrase}"),
        }
    }

    pub fn view(&self) -> Option<&ElectionView> {
        match self {
            Route::Election { view, .. } => Some(view),
            _ => None,
        }
    }
}

/// Absolute data-entry URL for an audit board, as printed on credential sheets.
pub fn audit_board_url(origin: &str, passphrase: &str) -> String {
    let path = Route::AuditBoardLogin {
        passphrase: passphrase.to_string(),
    }
    .to_path();
    match Url::parse(origin).and_then(|base| base.join(&path)) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", origin.trim_end_matches('/'), path),
    }
}
