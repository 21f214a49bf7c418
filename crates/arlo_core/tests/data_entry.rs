use std::sync::Once;

use arlo_core::model::{
    AuditStatusSnapshot, Ballot, BallotInterpretation, BallotKey, Batch, Contest, Interpretation,
};
use arlo_core::{
    update, ActionKind, AppState, AuditAction, AuditFlow, BoardIdentity, Effect, EntryMode,
    EntryMsg, Msg, Role, Route, Screen, SessionContext,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(arlo_logging::initialize_for_tests);
}

fn board_session() -> SessionContext {
    SessionContext::new(
        "e1",
        Role::AuditBoard(BoardIdentity {
            audit_board_id: "ab1".to_string(),
            name: "Audit Board #1".to_string(),
            jurisdiction_id: "j1".to_string(),
            round_id: "r1".to_string(),
        }),
        AuditFlow::Multi,
    )
}

fn ballot(batch: &str, position: u32, interpretations: Vec<BallotInterpretation>) -> Ballot {
    Ballot {
        position,
        batch: Batch {
            id: batch.to_string(),
            name: format!("Batch {batch}"),
            tabulator: Some("T1".to_string()),
            ..Batch::default()
        },
        ticket_number: None,
        status: None,
        interpretations,
        audit_board: None,
    }
}

fn key(batch: &str, position: u32) -> BallotKey {
    BallotKey {
        batch_id: batch.to_string(),
        position,
    }
}

fn ballot_route(batch: &str, position: u32) -> Route {
    Route::BallotEntry {
        election_id: "e1".to_string(),
        audit_board_id: "ab1".to_string(),
        key: key(batch, position),
    }
}

fn status() -> AuditStatusSnapshot {
    AuditStatusSnapshot {
        name: "Audit".to_string(),
        is_multi_jurisdiction: true,
        contests: vec![Contest {
            id: "c1".to_string(),
            ..Contest::default()
        }],
        ..AuditStatusSnapshot::default()
    }
}

/// Mounts a board view on `route` with status and ballots loaded.
fn loaded(route: Route, ballots: Vec<Ballot>) -> AppState {
    let (state, effects) = update(AppState::new(board_session(), route), Msg::Mounted);
    assert_eq!(
        effects,
        vec![
            Effect::FetchStatus { seq: 1 },
            Effect::FetchBoardBallots {
                jurisdiction_id: "j1".to_string(),
                round_id: "r1".to_string(),
                audit_board_id: "ab1".to_string(),
            },
        ]
    );
    let (state, _) = update(
        state,
        Msg::StatusLoaded {
            seq: 1,
            result: Ok(status()),
        },
    );
    let (state, _) = update(state, Msg::BoardBallotsLoaded(Ok(ballots)));
    state
}

fn three_ballots() -> Vec<Ballot> {
    vec![
        ballot("b1", 3, Vec::new()),
        ballot("b1", 7, Vec::new()),
        ballot("b2", 1, Vec::new()),
    ]
}

#[test]
fn opening_a_ballot_starts_in_auditing_with_empty_interpretation() {
    init_logging();
    let state = loaded(ballot_route("b1", 7), three_ballots());
    let view = state.view();
    assert_eq!(view.screen, Screen::BallotAudit(key("b1", 7)));
    let entry = view.entry.unwrap();
    assert_eq!(entry.ordinal, 2);
    assert_eq!(entry.total, 3);
    assert_eq!(entry.batch_name, "Batch b1");
    assert_eq!(entry.tabulator.as_deref(), Some("T1"));
    assert_eq!(entry.interpretation, BallotInterpretation::empty("c1"));
}

#[test]
fn review_then_previous_lands_in_auditing() {
    init_logging();
    let state = loaded(ballot_route("b1", 7), three_ballots());
    let (state, _) = update(state, Msg::Entry(EntryMsg::GoReview));
    assert_eq!(state.view().screen, Screen::BallotReview(key("b1", 7)));

    let (state, effects) = update(state, Msg::Entry(EntryMsg::Previous));
    assert_eq!(
        effects,
        vec![Effect::Navigate(
            "/election/e1/board/ab1/batch/b1/ballot/3".to_string()
        )]
    );
    let view = state.view();
    assert_eq!(view.screen, Screen::BallotAudit(key("b1", 3)));
    assert_eq!(view.entry.unwrap().mode, EntryMode::Auditing);
}

#[test]
fn edits_are_ignored_while_reviewing() {
    init_logging();
    let state = loaded(ballot_route("b1", 3), three_ballots());
    let (state, _) = update(
        state,
        Msg::Entry(EntryMsg::SetChoice(Some("choice-A".to_string()))),
    );
    let (state, _) = update(state, Msg::Entry(EntryMsg::GoReview));
    let (state, _) = update(
        state,
        Msg::Entry(EntryMsg::SetInterpretation(Some(Interpretation::Blank))),
    );
    let entry = state.view().entry.unwrap();
    assert_eq!(entry.interpretation.interpretation, Some(Interpretation::Vote));
    assert_eq!(entry.interpretation.choice_id.as_deref(), Some("choice-A"));

    let (state, _) = update(state, Msg::Entry(EntryMsg::Edit));
    let (state, _) = update(
        state,
        Msg::Entry(EntryMsg::SetInterpretation(Some(Interpretation::Blank))),
    );
    let entry = state.view().entry.unwrap();
    assert_eq!(entry.interpretation.interpretation, Some(Interpretation::Blank));
    assert_eq!(entry.interpretation.choice_id, None);
}

fn submitted() -> BallotInterpretation {
    BallotInterpretation {
        contest_id: "c1".to_string(),
        interpretation: Some(Interpretation::Vote),
        choice_id: Some("choice-A".to_string()),
        comment: None,
    }
}

fn board_ballots_fetch() -> Effect {
    Effect::FetchBoardBallots {
        jurisdiction_id: "j1".to_string(),
        round_id: "r1".to_string(),
        audit_board_id: "ab1".to_string(),
    }
}

/// Picks choice-A on b1/3 and submits it from review.
fn submit_first_ballot() -> AppState {
    let state = loaded(ballot_route("b1", 3), three_ballots());
    let (state, _) = update(
        state,
        Msg::Entry(EntryMsg::SetChoice(Some("choice-A".to_string()))),
    );
    let (state, _) = update(state, Msg::Entry(EntryMsg::GoReview));
    let (state, effects) = update(state, Msg::Entry(EntryMsg::Submit));
    assert_eq!(
        effects,
        vec![Effect::RunAction(AuditAction::SubmitInterpretation {
            jurisdiction_id: "j1".to_string(),
            key: key("b1", 3),
            interpretations: vec![submitted()],
        })]
    );
    state
}

fn submit_finished(state: AppState, result: Result<(), String>) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::ActionFinished {
            action: ActionKind::SubmitInterpretation,
            result,
        },
    )
}

#[test]
fn submit_moves_on_only_after_the_server_accepts() {
    init_logging();
    let state = submit_first_ballot();
    assert_eq!(state.view().screen, Screen::BallotReview(key("b1", 3)));

    let (state, effects) = submit_finished(state, Ok(()));
    assert_eq!(
        effects,
        vec![
            Effect::FetchStatus { seq: 2 },
            board_ballots_fetch(),
            Effect::Navigate("/election/e1/board/ab1/batch/b1/ballot/7".to_string()),
        ]
    );
    let entry = state.view().entry.unwrap();
    assert_eq!(entry.key, key("b1", 7));
    assert_eq!(entry.interpretation, BallotInterpretation::empty("c1"));
}

#[test]
fn returning_before_the_refreshed_list_shows_the_submitted_interpretation() {
    init_logging();
    let state = submit_first_ballot();
    let (state, _) = submit_finished(state, Ok(()));

    // The refetched ballot list has not arrived yet.
    let (state, effects) = update(state, Msg::Entry(EntryMsg::Previous));
    assert_eq!(
        effects,
        vec![Effect::Navigate(
            "/election/e1/board/ab1/batch/b1/ballot/3".to_string()
        )]
    );
    let entry = state.view().entry.unwrap();
    assert_eq!(entry.key, key("b1", 3));
    assert_eq!(entry.mode, EntryMode::Auditing);
    assert_eq!(entry.interpretation, submitted());

    let mut refreshed = three_ballots();
    refreshed[0].interpretations = vec![submitted()];
    let (state, _) = update(state, Msg::BoardBallotsLoaded(Ok(refreshed)));
    assert_eq!(state.view().entry.unwrap().interpretation, submitted());
}

#[test]
fn refreshed_list_fills_in_the_open_ballot_while_auditing() {
    init_logging();
    let state = loaded(ballot_route("b1", 7), three_ballots());

    let mut refreshed = three_ballots();
    refreshed[1].interpretations = vec![submitted()];
    let (state, _) = update(state, Msg::BoardBallotsLoaded(Ok(refreshed.clone())));
    assert_eq!(state.view().entry.unwrap().interpretation, submitted());

    // The same list again leaves local edits alone.
    let (state, _) = update(
        state,
        Msg::Entry(EntryMsg::SetInterpretation(Some(Interpretation::Blank))),
    );
    let (state, _) = update(state, Msg::BoardBallotsLoaded(Ok(refreshed)));
    assert_eq!(
        state.view().entry.unwrap().interpretation.interpretation,
        Some(Interpretation::Blank)
    );
}

#[test]
fn refreshed_list_leaves_a_reviewed_ballot_alone() {
    init_logging();
    let state = loaded(ballot_route("b1", 7), three_ballots());
    let (state, _) = update(state, Msg::Entry(EntryMsg::GoReview));

    let mut refreshed = three_ballots();
    refreshed[1].interpretations = vec![submitted()];
    let (state, _) = update(state, Msg::BoardBallotsLoaded(Ok(refreshed)));
    let entry = state.view().entry.unwrap();
    assert_eq!(entry.mode, EntryMode::Reviewing);
    assert_eq!(entry.interpretation, BallotInterpretation::empty("c1"));
}

#[test]
fn failed_submit_stays_on_the_ballot_and_can_be_retried() {
    init_logging();
    let state = submit_first_ballot();

    // Navigation is held while the submission is in flight.
    let (state, effects) = update(state, Msg::Entry(EntryMsg::Next));
    assert!(effects.is_empty());

    let (state, effects) = submit_finished(state, Err("Server error".to_string()));
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.notice.as_deref(), Some("Server error"));
    assert_eq!(view.screen, Screen::BallotReview(key("b1", 3)));
    let entry = view.entry.unwrap();
    assert_eq!(entry.interpretation, submitted());

    let (state, effects) = update(state, Msg::Entry(EntryMsg::Submit));
    assert_eq!(
        effects,
        vec![Effect::RunAction(AuditAction::SubmitInterpretation {
            jurisdiction_id: "j1".to_string(),
            key: key("b1", 3),
            interpretations: vec![submitted()],
        })]
    );
    let (state, effects) = submit_finished(state, Ok(()));
    assert_eq!(
        effects.last(),
        Some(&Effect::Navigate(
            "/election/e1/board/ab1/batch/b1/ballot/7".to_string()
        ))
    );
    assert_eq!(state.view().entry.unwrap().key, key("b1", 7));
}

#[test]
fn submit_requires_review() {
    init_logging();
    let state = loaded(ballot_route("b1", 3), three_ballots());
    let (state, effects) = update(state, Msg::Entry(EntryMsg::Submit));
    assert!(effects.is_empty());
    assert_eq!(state.view().screen, Screen::BallotAudit(key("b1", 3)));
}

#[test]
fn next_past_last_ballot_returns_home() {
    init_logging();
    let state = loaded(ballot_route("b2", 1), three_ballots());
    let (state, effects) = update(state, Msg::Entry(EntryMsg::Next));
    assert_eq!(
        effects,
        vec![Effect::Navigate("/election/e1/board/ab1".to_string())]
    );
    let view = state.view();
    assert_eq!(view.screen, Screen::AuditBoardHome);
    assert_eq!(view.entry, None);
}

#[test]
fn unknown_ballot_redirects_to_board_home() {
    init_logging();
    let state = loaded(ballot_route("b9", 42), three_ballots());
    assert_eq!(state.view().screen, Screen::AuditBoardHome);
    assert_eq!(
        *state.route(),
        Route::BoardHome {
            election_id: "e1".to_string(),
            audit_board_id: "ab1".to_string(),
        }
    );

    let (state, effects) = update(state, Msg::RouteChanged(ballot_route("b7", 1)));
    assert_eq!(
        effects,
        vec![Effect::Navigate("/election/e1/board/ab1".to_string())]
    );
    assert_eq!(state.view().entry, None);
}

#[test]
fn blank_comment_is_dropped() {
    init_logging();
    let state = loaded(ballot_route("b1", 3), three_ballots());
    let (state, _) = update(
        state,
        Msg::Entry(EntryMsg::SetComment(Some("   ".to_string()))),
    );
    assert_eq!(state.view().entry.unwrap().interpretation.comment, None);
    let (state, _) = update(
        state,
        Msg::Entry(EntryMsg::SetComment(Some("torn corner".to_string()))),
    );
    assert_eq!(
        state.view().entry.unwrap().interpretation.comment.as_deref(),
        Some("torn corner")
    );
}
