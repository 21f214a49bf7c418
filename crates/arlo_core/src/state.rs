use crate::data_entry::{BallotEntry, PendingSubmission};
use crate::effect::{Effect, PollKind, RequestSeq};
use crate::model::{
    AuditStatusSnapshot, Ballot, BallotInterpretation, BallotKey, JurisdictionFileStatus,
};
use crate::route::Route;
use crate::screen::{select_screen, ScreenInputs};
use crate::session::{AuditFlow, Role, SessionContext};
use crate::setup::{setup_menu, SetupStage};
use crate::validate::ValidationError;
use crate::view_model::{AppViewModel, EntryView};

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    session: SessionContext,
    route: Route,
    stage: SetupStage,
    snapshot: Option<AuditStatusSnapshot>,
    issued_seq: RequestSeq,
    refreshing: bool,
    actions_in_flight: usize,
    active_polls: Vec<PollKind>,
    jurisdiction_file: Option<JurisdictionFileStatus>,
    board_ballots: Option<Vec<Ballot>>,
    entry: Option<BallotEntry>,
    pending_submission: Option<PendingSubmission>,
    sample_size_input: String,
    sample_size_error: Option<ValidationError>,
    notice: Option<String>,
    mounted: bool,
}

impl AppState {
    pub fn new(session: SessionContext, route: Route) -> Self {
        Self {
            session,
            route,
            stage: SetupStage::default(),
            snapshot: None,
            issued_seq: 0,
            refreshing: false,
            actions_in_flight: 0,
            active_polls: Vec::new(),
            jurisdiction_file: None,
            board_ballots: None,
            entry: None,
            pending_submission: None,
            sample_size_input: String::new(),
            sample_size_error: None,
            notice: None,
            mounted: false,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn snapshot(&self) -> Option<&AuditStatusSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Loading while a refresh, an action or a status poll is outstanding.
    pub fn is_loading(&self) -> bool {
        self.refreshing
            || self.actions_in_flight > 0
            || self
                .active_polls
                .iter()
                .any(|poll| matches!(poll, PollKind::Status(_)))
    }

    pub fn active_polls(&self) -> &[PollKind] {
        &self.active_polls
    }

    pub fn latest_seq(&self) -> RequestSeq {
        self.issued_seq
    }

    pub fn view(&self) -> AppViewModel {
        let loading = self.is_loading();
        let screen = select_screen(&ScreenInputs {
            session: &self.session,
            route: &self.route,
            snapshot: self.snapshot.as_ref(),
            stage: self.stage,
            entry: self.entry.as_ref(),
            loading,
        });
        let menu = match (&self.session.role, self.session.flow) {
            (Role::AuditAdmin, AuditFlow::Multi) => {
                setup_menu(self.stage, self.jurisdiction_file.as_ref())
            }
            _ => Vec::new(),
        };
        let entry = self.entry.as_ref().map(|entry| {
            let ballot = self
                .board_ballots
                .as_deref()
                .and_then(|ballots| ballots.iter().find(|b| b.key() == *entry.key()));
            EntryView {
                key: entry.key().clone(),
                ordinal: entry.ordinal(),
                total: entry.total(),
                mode: entry.mode(),
                interpretation: entry.interpretation().clone(),
                batch_name: ballot.map(|b| b.batch.name.clone()).unwrap_or_default(),
                tabulator: ballot.and_then(|b| b.batch.tabulator.clone()),
            }
        });

        AppViewModel {
            screen,
            audit_name: self
                .snapshot
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            round_count: self.snapshot.as_ref().map_or(0, |s| s.rounds.len()),
            loading,
            menu,
            notice: self.notice.clone(),
            entry,
            sample_size_input: self.sample_size_input.clone(),
            sample_size_error: self.sample_size_error.as_ref().map(ToString::to_string),
        }
    }

    pub(crate) fn mount(&mut self) -> bool {
        !std::mem::replace(&mut self.mounted, true)
    }

    pub(crate) fn unmount(&mut self) {
        self.mounted = false;
        self.refreshing = false;
        self.actions_in_flight = 0;
        self.active_polls.clear();
        self.pending_submission = None;
    }

    /// Issues the next status fetch.
    pub(crate) fn request_status(&mut self) -> Effect {
        self.issued_seq += 1;
        self.refreshing = true;
        Effect::FetchStatus {
            seq: self.issued_seq,
        }
    }

    /// Applies a status response. Returns false when it is stale and dropped.
    pub(crate) fn apply_status(
        &mut self,
        seq: RequestSeq,
        result: Result<AuditStatusSnapshot, String>,
    ) -> bool {
        if seq < self.issued_seq {
            return false;
        }
        self.refreshing = false;
        match result {
            Ok(snapshot) => self.snapshot = Some(snapshot),
            Err(message) => self.notice = Some(message),
        }
        true
    }

    pub(crate) fn set_jurisdiction_file(&mut self, status: JurisdictionFileStatus) {
        self.jurisdiction_file = Some(status);
    }

    pub(crate) fn jurisdiction_file(&self) -> Option<&JurisdictionFileStatus> {
        self.jurisdiction_file.as_ref()
    }

    pub(crate) fn set_board_ballots(&mut self, ballots: Vec<Ballot>) {
        self.board_ballots = Some(ballots);
    }

    pub(crate) fn board_ballots(&self) -> Option<&[Ballot]> {
        self.board_ballots.as_deref()
    }

    /// Stores an accepted interpretation in the cached ballot list, replacing
    /// any earlier one for the same contest.
    pub(crate) fn record_interpretation(
        &mut self,
        key: &BallotKey,
        interpretation: BallotInterpretation,
    ) {
        let Some(ballot) = self
            .board_ballots
            .as_mut()
            .and_then(|ballots| ballots.iter_mut().find(|b| b.key() == *key))
        else {
            return;
        };
        ballot
            .interpretations
            .retain(|i| i.contest_id != interpretation.contest_id);
        ballot.interpretations.push(interpretation);
    }

    pub(crate) fn is_submitting(&self) -> bool {
        self.pending_submission.is_some()
    }

    pub(crate) fn set_pending_submission(&mut self, submission: PendingSubmission) {
        self.pending_submission = Some(submission);
    }

    pub(crate) fn take_pending_submission(&mut self) -> Option<PendingSubmission> {
        self.pending_submission.take()
    }

    pub(crate) fn set_route(&mut self, route: Route) {
        self.route = route;
    }

    pub(crate) fn stage(&self) -> SetupStage {
        self.stage
    }

    pub(crate) fn set_stage(&mut self, stage: SetupStage) {
        self.stage = stage;
    }

    pub(crate) fn entry(&self) -> Option<&BallotEntry> {
        self.entry.as_ref()
    }

    pub(crate) fn entry_mut(&mut self) -> Option<&mut BallotEntry> {
        self.entry.as_mut()
    }

    pub(crate) fn set_entry(&mut self, entry: Option<BallotEntry>) {
        self.entry = entry;
    }

    /// The contest ballots are interpreted for: the audit's first contest.
    pub(crate) fn primary_contest_id(&self) -> Option<&str> {
        self.snapshot
            .as_ref()
            .and_then(|s| s.contests.first())
            .map(|c| c.id.as_str())
    }

    pub(crate) fn sample_size_input(&self) -> &str {
        &self.sample_size_input
    }

    pub(crate) fn set_sample_size_input(&mut self, raw: String) {
        self.sample_size_input = raw;
        self.sample_size_error = None;
    }

    pub(crate) fn set_sample_size_error(&mut self, error: ValidationError) {
        self.sample_size_error = Some(error);
    }

    pub(crate) fn begin_action(&mut self) {
        self.actions_in_flight += 1;
    }

    pub(crate) fn finish_action(&mut self) {
        self.actions_in_flight = self.actions_in_flight.saturating_sub(1);
    }

    /// Registers a poll; false when one of the same kind is already running.
    pub(crate) fn begin_poll(&mut self, poll: PollKind) -> bool {
        if self.active_polls.contains(&poll) {
            return false;
        }
        self.active_polls.push(poll);
        true
    }

    /// Unregisters a poll; false when it was not running (e.g. after teardown).
    pub(crate) fn finish_poll(&mut self, poll: PollKind) -> bool {
        let before = self.active_polls.len();
        self.active_polls.retain(|p| *p != poll);
        self.active_polls.len() != before
    }

    pub(crate) fn set_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    pub(crate) fn clear_notice(&mut self) {
        self.notice = None;
    }
}
