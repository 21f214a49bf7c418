use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arlo_core::model::{
    AuditStatusSnapshot, Ballot, Contest, JurisdictionFileStatus, Round, RoundContest,
    SampleSizeOption,
};
use arlo_core::{ActionKind, AuditAction, PollKind, StatusTarget};
use arlo_engine::{
    ApiError, AuditApi, EngineEvent, EngineHandle, PollError, PollSettings, RequestError,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    arlo_logging::initialize_for_tests();
}

/// In-memory server: status becomes "options ready" after `ready_after`
/// status calls. Each status call waits `delay` first.
struct FakeApi {
    status_calls: AtomicUsize,
    ready_after: usize,
    delay: Duration,
    actions: Mutex<Vec<AuditAction>>,
}

impl FakeApi {
    fn new(ready_after: usize, delay: Duration) -> Self {
        Self {
            status_calls: AtomicUsize::new(0),
            ready_after,
            delay,
            actions: Mutex::new(Vec::new()),
        }
    }
}

fn status_with_options(ready: bool) -> AuditStatusSnapshot {
    AuditStatusSnapshot {
        name: "Audit".to_string(),
        contests: vec![Contest {
            id: "c1".to_string(),
            ..Contest::default()
        }],
        rounds: vec![Round {
            id: "r1".to_string(),
            contests: vec![RoundContest {
                id: "c1".to_string(),
                sample_size_options: ready.then(|| {
                    vec![SampleSizeOption {
                        kind: None,
                        prob: None,
                        size: 10,
                    }]
                }),
                ..RoundContest::default()
            }],
            ..Round::default()
        }],
        ..AuditStatusSnapshot::default()
    }
}

#[async_trait::async_trait]
impl AuditApi for FakeApi {
    async fn audit_status(&self, election_id: &str) -> Result<AuditStatusSnapshot, ApiError> {
        assert_eq!(election_id, "e1");
        tokio::time::sleep(self.delay).await;
        let call = self.status_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(status_with_options(call >= self.ready_after))
    }

    async fn jurisdiction_file(
        &self,
        _election_id: &str,
    ) -> Result<JurisdictionFileStatus, ApiError> {
        Err(ApiError::Request(RequestError {
            status: 500,
            status_text: "Internal Server Error".to_string(),
        }))
    }

    async fn board_ballots(
        &self,
        _election_id: &str,
        _jurisdiction_id: &str,
        _audit_board_id: &str,
        _round_id: &str,
    ) -> Result<Vec<Ballot>, ApiError> {
        Ok(Vec::new())
    }

    async fn run_action(&self, _election_id: &str, action: AuditAction) -> Result<(), ApiError> {
        self.actions.lock().unwrap().push(action);
        Ok(())
    }
}

fn fast_polls() -> PollSettings {
    PollSettings {
        timeout: Duration::from_millis(2_000),
        interval: Duration::from_millis(5),
    }
}

fn next_event(engine: &EngineHandle) -> EngineEvent {
    engine
        .recv_timeout(Duration::from_secs(5))
        .expect("engine event")
}

#[test]
fn status_fetch_reports_sequence() {
    init_logging();
    let api = Arc::new(FakeApi::new(1, Duration::ZERO));
    let engine = EngineHandle::with_api(api, "e1".to_string(), fast_polls());

    engine.fetch_status(7);
    match next_event(&engine) {
        EngineEvent::StatusFetched { seq, result } => {
            assert_eq!(seq, 7);
            assert_eq!(result.unwrap().name, "Audit");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn failures_are_reported_as_events() {
    init_logging();
    let api = Arc::new(FakeApi::new(1, Duration::ZERO));
    let engine = EngineHandle::with_api(api, "e1".to_string(), fast_polls());

    engine.fetch_jurisdiction_file();
    assert_eq!(
        next_event(&engine),
        EngineEvent::JurisdictionFileFetched(Err(ApiError::Request(RequestError {
            status: 500,
            status_text: "Internal Server Error".to_string(),
        })))
    );
}

#[test]
fn actions_are_forwarded_and_completed() {
    init_logging();
    let api = Arc::new(FakeApi::new(1, Duration::ZERO));
    let engine = EngineHandle::with_api(api.clone(), "e1".to_string(), fast_polls());

    engine.run_action(AuditAction::SubmitSampleSize { size: 42 });
    assert_eq!(
        next_event(&engine),
        EngineEvent::ActionCompleted {
            action: ActionKind::SubmitSampleSize,
            result: Ok(()),
        }
    );
    assert_eq!(
        *api.actions.lock().unwrap(),
        vec![AuditAction::SubmitSampleSize { size: 42 }]
    );
}

#[test]
fn status_poll_settles_when_target_reached() {
    init_logging();
    let api = Arc::new(FakeApi::new(3, Duration::ZERO));
    let engine = EngineHandle::with_api(api.clone(), "e1".to_string(), fast_polls());

    let poll = PollKind::Status(StatusTarget::SampleSizeOptionsReady);
    engine.start_poll(poll);
    assert_eq!(
        next_event(&engine),
        EngineEvent::PollSettled {
            poll,
            result: Ok(()),
        }
    );
    assert_eq!(api.status_calls.load(Ordering::SeqCst), 3);
}

#[test]
fn status_poll_times_out() {
    init_logging();
    let api = Arc::new(FakeApi::new(usize::MAX, Duration::ZERO));
    let engine = EngineHandle::with_api(
        api,
        "e1".to_string(),
        PollSettings {
            timeout: Duration::from_millis(30),
            interval: Duration::from_millis(5),
        },
    );

    let poll = PollKind::Status(StatusTarget::SampleSizesSelected);
    engine.start_poll(poll);
    assert_eq!(
        next_event(&engine),
        EngineEvent::PollSettled {
            poll,
            result: Err(PollError::Timeout),
        }
    );
}

#[test]
fn cancel_all_silences_outstanding_work() {
    init_logging();
    let api = Arc::new(FakeApi::new(usize::MAX, Duration::from_millis(200)));
    let engine = EngineHandle::with_api(api, "e1".to_string(), fast_polls());

    engine.fetch_status(1);
    engine.start_poll(PollKind::Status(StatusTarget::SampleSizeOptionsReady));
    std::thread::sleep(Duration::from_millis(20));
    engine.cancel_all();

    assert_eq!(engine.recv_timeout(Duration::from_millis(500)), None);

    // Work issued after teardown runs under a fresh lifetime.
    engine.run_action(AuditAction::ResetAudit);
    assert_eq!(
        next_event(&engine),
        EngineEvent::ActionCompleted {
            action: ActionKind::ResetAudit,
            result: Ok(()),
        }
    );
}
