use crate::data_entry::{BallotEntry, Navigation, PendingSubmission};
use crate::effect::{ActionKind, AuditAction, Effect, PollKind, PollOutcome};
use crate::model::BallotInterpretation;
use crate::msg::EntryMsg;
use crate::route::Route;
use crate::session::{AuditFlow, Role};
use crate::setup::{stage_state, MenuItemState};
use crate::validate::validate_count;
use crate::{AppState, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Mounted => {
            if !state.mount() {
                return (state, Vec::new());
            }
            mount_effects(&mut state)
        }
        Msg::Unmounted => {
            if !state.is_mounted() {
                return (state, Vec::new());
            }
            state.unmount();
            vec![Effect::CancelAll]
        }
        // Everything below reacts to a live view only; late engine events
        // after teardown are dropped.
        _ if !state.is_mounted() => Vec::new(),
        Msg::RefreshRequested => {
            vec![state.request_status()]
        }
        Msg::StatusLoaded { seq, result } => {
            if !state.apply_status(seq, result) {
                return (state, Vec::new());
            }
            sync_entry(&mut state)
        }
        Msg::JurisdictionFileLoaded(result) => {
            match result {
                Ok(status) => {
                    let processing = status.processing.is_some() && !status.is_settled();
                    state.set_jurisdiction_file(status);
                    if processing {
                        start_poll(&mut state, PollKind::JurisdictionFile)
                    } else {
                        Vec::new()
                    }
                }
                Err(message) => {
                    state.set_notice(message);
                    Vec::new()
                }
            }
        }
        Msg::BoardBallotsLoaded(result) => {
            match result {
                Ok(ballots) => {
                    let stored_before = stored_for_entry(&state);
                    state.set_board_ballots(ballots);
                    let stored_after = stored_for_entry(&state);
                    if stored_after != stored_before {
                        if let (Some(entry), Some(stored)) = (state.entry_mut(), stored_after) {
                            entry.reseed(stored);
                        }
                    }
                    sync_entry(&mut state)
                }
                Err(message) => {
                    state.set_notice(message);
                    Vec::new()
                }
            }
        }
        Msg::RouteChanged(route) => {
            if *state.route() == route {
                return (state, Vec::new());
            }
            state.set_route(route);
            sync_entry(&mut state)
        }
        Msg::SetupStageSelected(stage) => {
            if stage != state.stage()
                && stage_state(stage, state.jurisdiction_file()) != MenuItemState::Locked
            {
                state.set_stage(stage);
            }
            Vec::new()
        }
        Msg::SampleSizeInput(raw) => {
            state.set_sample_size_input(raw);
            Vec::new()
        }
        Msg::SampleSizeSubmitted => {
            let max = state
                .snapshot()
                .and_then(|s| s.contests.first())
                .and_then(|c| c.total_ballots_cast);
            match validate_count(state.sample_size_input(), max, None) {
                Ok(size) => run_action(&mut state, AuditAction::SubmitSampleSize { size }),
                Err(error) => {
                    state.set_sample_size_error(error);
                    Vec::new()
                }
            }
        }
        Msg::ActionRequested(action) => run_action(&mut state, action),
        Msg::ActionFinished { action, result } => {
            state.finish_action();
            let submission = match action {
                ActionKind::SubmitInterpretation => state.take_pending_submission(),
                _ => None,
            };
            match result {
                Ok(()) => {
                    let mut effects = action_follow_ups(&mut state, action);
                    if let Some(submission) = submission {
                        effects.extend(submission_accepted(&mut state, submission));
                    }
                    effects
                }
                Err(message) => {
                    state.set_notice(message);
                    Vec::new()
                }
            }
        }
        Msg::PollSettled { poll, outcome } => {
            if !state.finish_poll(poll) {
                return (state, Vec::new());
            }
            match (outcome, poll) {
                (PollOutcome::Done, PollKind::Status(_)) => vec![state.request_status()],
                (PollOutcome::Done, PollKind::JurisdictionFile) => {
                    vec![Effect::FetchJurisdictionFile]
                }
                (PollOutcome::TimedOut, _) => {
                    state.set_notice("Timed out");
                    Vec::new()
                }
            }
        }
        Msg::Entry(entry_msg) => update_entry(&mut state, entry_msg),
        Msg::NoticeDismissed => {
            state.clear_notice();
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn mount_effects(state: &mut AppState) -> Vec<Effect> {
    let mut effects = vec![state.request_status()];
    let session = state.session();
    match (&session.role, session.flow) {
        (Role::AuditAdmin, AuditFlow::Multi) => effects.push(Effect::FetchJurisdictionFile),
        (Role::AuditBoard(board), _) => effects.push(Effect::FetchBoardBallots {
            jurisdiction_id: board.jurisdiction_id.clone(),
            round_id: board.round_id.clone(),
            audit_board_id: board.audit_board_id.clone(),
        }),
        (Role::AuditAdmin, AuditFlow::Single) | (Role::JurisdictionAdmin, _) => {}
    }
    effects
}

fn run_action(state: &mut AppState, action: AuditAction) -> Vec<Effect> {
    state.begin_action();
    vec![Effect::RunAction(action)]
}

fn start_poll(state: &mut AppState, poll: PollKind) -> Vec<Effect> {
    if state.begin_poll(poll) {
        vec![Effect::StartPoll(poll)]
    } else {
        Vec::new()
    }
}

fn action_follow_ups(state: &mut AppState, action: ActionKind) -> Vec<Effect> {
    let mut effects = vec![state.request_status()];
    match action {
        ActionKind::UploadJurisdictionsFile => effects.push(Effect::FetchJurisdictionFile),
        ActionKind::SubmitInterpretation => {
            if let Some(board) = state.session().board() {
                effects.push(Effect::FetchBoardBallots {
                    jurisdiction_id: board.jurisdiction_id.clone(),
                    round_id: board.round_id.clone(),
                    audit_board_id: board.audit_board_id.clone(),
                });
            }
        }
        ActionKind::ResetAudit => state.set_stage(Default::default()),
        ActionKind::SubmitAuditBasics | ActionKind::SubmitSampleSize | ActionKind::UploadManifest => {}
    }
    if let Some(poll) = action.follow_up_poll() {
        effects.extend(start_poll(state, poll));
    }
    effects
}

fn board_home(state: &AppState) -> Option<Route> {
    state.session().board().map(|board| Route::BoardHome {
        election_id: state.session().election_id.clone(),
        audit_board_id: board.audit_board_id.clone(),
    })
}

/// The stored interpretation of the open ballot, empty when none is stored.
fn stored_for_entry(state: &AppState) -> Option<BallotInterpretation> {
    let key = state.entry()?.key().clone();
    let contest_id = state.primary_contest_id()?;
    let ballot = state.board_ballots()?.iter().find(|b| b.key() == key)?;
    Some(
        ballot
            .interpretation_for(contest_id)
            .cloned()
            .unwrap_or_else(|| BallotInterpretation::empty(contest_id)),
    )
}

/// Records the accepted interpretation and moves on if the ballot is still open.
fn submission_accepted(state: &mut AppState, submission: PendingSubmission) -> Vec<Effect> {
    state.record_interpretation(&submission.key, submission.interpretation);
    let ballots = state.board_ballots().map(<[_]>::to_vec).unwrap_or_default();
    let Some(entry) = state.entry_mut().filter(|entry| *entry.key() == submission.key) else {
        return Vec::new();
    };
    let navigation = entry.next(&ballots);
    navigate(state, navigation)
}

/// Keeps the open ballot in line with the route once ballots and contests are known.
fn sync_entry(state: &mut AppState) -> Vec<Effect> {
    let key = match state.route() {
        Route::BallotEntry { key, .. } => key.clone(),
        _ => {
            state.set_entry(None);
            return Vec::new();
        }
    };
    if state.entry().is_some_and(|entry| *entry.key() == key) {
        return Vec::new();
    }
    let opened = match (state.board_ballots(), state.primary_contest_id()) {
        (Some(ballots), Some(contest_id)) => BallotEntry::open(ballots, contest_id, &key),
        _ => {
            state.set_entry(None);
            return Vec::new();
        }
    };
    match opened {
        Some(entry) => {
            state.set_entry(Some(entry));
            Vec::new()
        }
        None => {
            state.set_entry(None);
            redirect_home(state)
        }
    }
}

fn redirect_home(state: &mut AppState) -> Vec<Effect> {
    match board_home(state) {
        Some(home) => {
            let path = home.to_path();
            state.set_route(home);
            vec![Effect::Navigate(path)]
        }
        None => Vec::new(),
    }
}

fn navigate(state: &mut AppState, navigation: Navigation) -> Vec<Effect> {
    match navigation {
        Navigation::Home => {
            state.set_entry(None);
            redirect_home(state)
        }
        Navigation::Ballot(key) => {
            let Some(board) = state.session().board() else {
                return Vec::new();
            };
            let route = Route::BallotEntry {
                election_id: state.session().election_id.clone(),
                audit_board_id: board.audit_board_id.clone(),
                key,
            };
            let path = route.to_path();
            state.set_route(route);
            let mut effects = sync_entry(state);
            effects.insert(0, Effect::Navigate(path));
            effects
        }
    }
}

fn update_entry(state: &mut AppState, msg: EntryMsg) -> Vec<Effect> {
    let ballots = state.board_ballots().map(<[_]>::to_vec).unwrap_or_default();
    let jurisdiction_id = state.session().board().map(|b| b.jurisdiction_id.clone());
    if state.is_submitting() {
        return Vec::new();
    }
    let Some(entry) = state.entry_mut() else {
        return Vec::new();
    };

    match msg {
        EntryMsg::SetInterpretation(verdict) => {
            entry.set_interpretation(verdict);
            Vec::new()
        }
        EntryMsg::SetChoice(choice) => {
            entry.set_choice(choice);
            Vec::new()
        }
        EntryMsg::SetComment(comment) => {
            entry.set_comment(comment);
            Vec::new()
        }
        EntryMsg::GoReview => {
            entry.go_review();
            Vec::new()
        }
        EntryMsg::Edit => {
            entry.edit();
            Vec::new()
        }
        EntryMsg::Previous => {
            let navigation = entry.previous(&ballots);
            navigate(state, navigation)
        }
        EntryMsg::Next => {
            let navigation = entry.next(&ballots);
            navigate(state, navigation)
        }
        EntryMsg::Submit => {
            let (Some(interpretation), Some(jurisdiction_id)) = (entry.submit(), jurisdiction_id)
            else {
                return Vec::new();
            };
            let key = entry.key().clone();
            state.set_pending_submission(PendingSubmission {
                key: key.clone(),
                interpretation: interpretation.clone(),
            });
            run_action(
                state,
                AuditAction::SubmitInterpretation {
                    jurisdiction_id,
                    key,
                    interpretations: vec![interpretation],
                },
            )
        }
    }
}
