//! Screen selection: which view to render for the current inputs.
//!
//! Nothing here is stored. The screen is recomputed from the latest snapshot,
//! the session, the route and the wizard stage every time the view is built.

use crate::data_entry::{BallotEntry, EntryMode};
use crate::model::{AuditStatusSnapshot, BallotKey};
use crate::route::{ElectionView, Route};
use crate::session::{AuditFlow, Role, SessionContext};
use crate::setup::SetupStage;

/// Gates and loading flags for the single-jurisdiction audit page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SinglePanels {
    pub show_select_ballots_to_audit: bool,
    pub show_calculate_risk_measurement: bool,
    pub estimate_loading: bool,
    pub select_loading: bool,
    pub calculate_loading: bool,
    pub reset_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Redirect(String),
    SetupWizard(SetupStage),
    ProgressView,
    RoundManagement,
    SingleJurisdiction(SinglePanels),
    BallotManifest,
    AuditBoardHome,
    BallotAudit(BallotKey),
    BallotReview(BallotKey),
}

pub struct ScreenInputs<'a> {
    pub session: &'a SessionContext,
    pub route: &'a Route,
    /// `None` until the first refresh lands.
    pub snapshot: Option<&'a AuditStatusSnapshot>,
    pub stage: SetupStage,
    pub entry: Option<&'a BallotEntry>,
    pub loading: bool,
}

/// True once every round-0 contest has sample size options to pick from.
pub fn show_select_ballots_to_audit(snapshot: &AuditStatusSnapshot) -> bool {
    !snapshot.contests.is_empty()
        && snapshot
            .first_round()
            .is_some_and(|round| round.contests.iter().all(|c| c.sample_size_options.is_some()))
}

/// True once a sample size has been chosen for every round-0 contest.
pub fn show_calculate_risk_measurement(snapshot: &AuditStatusSnapshot) -> bool {
    snapshot
        .first_round()
        .is_some_and(|round| round.contests.iter().all(|c| c.sample_size.is_some()))
}

pub fn single_panels(snapshot: &AuditStatusSnapshot, loading: bool) -> SinglePanels {
    let select = show_select_ballots_to_audit(snapshot);
    let calculate = show_calculate_risk_measurement(snapshot);
    SinglePanels {
        show_select_ballots_to_audit: select,
        show_calculate_risk_measurement: calculate,
        estimate_loading: loading && !select,
        select_loading: loading && !calculate,
        calculate_loading: loading,
        reset_disabled: snapshot.contests.is_empty() || loading,
    }
}

/// Where an audit of the snapshot's type lives.
pub fn canonical_root(snapshot: &AuditStatusSnapshot, election_id: &str) -> String {
    if snapshot.is_multi_jurisdiction {
        Route::Root.to_path()
    } else {
        Route::election(election_id).to_path()
    }
}

pub fn select_screen(inputs: &ScreenInputs<'_>) -> Screen {
    let session = inputs.session;

    if let Some(snapshot) = inputs.snapshot {
        let snapshot_flow = if snapshot.is_multi_jurisdiction {
            AuditFlow::Multi
        } else {
            AuditFlow::Single
        };
        if snapshot_flow != session.flow {
            return Screen::Redirect(canonical_root(snapshot, &session.election_id));
        }
    }

    match (&session.role, session.flow) {
        (Role::AuditAdmin, AuditFlow::Multi) => match inputs.route.view() {
            Some(ElectionView::Setup) => Screen::SetupWizard(inputs.stage),
            Some(ElectionView::Progress) => Screen::ProgressView,
            Some(ElectionView::Overview | ElectionView::Other(_)) | None => {
                Screen::RoundManagement
            }
        },
        (Role::AuditAdmin, AuditFlow::Single) => {
            let empty = AuditStatusSnapshot::default();
            let snapshot = inputs.snapshot.unwrap_or(&empty);
            Screen::SingleJurisdiction(single_panels(snapshot, inputs.loading))
        }
        (Role::JurisdictionAdmin, _) => Screen::BallotManifest,
        (Role::AuditBoard(_), _) => match inputs.entry {
            Some(entry) => match entry.mode() {
                EntryMode::Auditing => Screen::BallotAudit(entry.key().clone()),
                EntryMode::Reviewing => Screen::BallotReview(entry.key().clone()),
            },
            None => Screen::AuditBoardHome,
        },
    }
}
