use std::future::Future;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use arlo_core::{AuditAction, PollKind, RequestSeq};
use arlo_logging::{arlo_debug, arlo_info, arlo_warn};
use tokio_util::sync::CancellationToken;

use crate::client::{ApiSettings, ArloClient, AuditApi};
use crate::poll::{spawn_poll, PollSettings};
use crate::{ApiError, EngineEvent};

enum EngineCommand {
    FetchStatus {
        seq: RequestSeq,
    },
    FetchJurisdictionFile,
    FetchBoardBallots {
        jurisdiction_id: String,
        round_id: String,
        audit_board_id: String,
    },
    RunAction(AuditAction),
    StartPoll(PollKind),
    CancelAll,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub api: ApiSettings,
    pub poll: PollSettings,
    pub election_id: String,
}

/// Runs server IO on its own thread and reports results as [`EngineEvent`]s.
///
/// Every task is tied to a lifetime token. [`EngineHandle::cancel_all`]
/// cancels outstanding requests and polls; nothing is reported for them.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, ApiError> {
        let client = ArloClient::new(settings.api)?;
        Ok(Self::with_api(
            Arc::new(client),
            settings.election_id,
            settings.poll,
        ))
    }

    pub fn with_api(api: Arc<dyn AuditApi>, election_id: String, poll: PollSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let mut lifetime = CancellationToken::new();
            while let Ok(command) = cmd_rx.recv() {
                if let EngineCommand::CancelAll = command {
                    arlo_info!("cancelling outstanding requests and polls");
                    lifetime.cancel();
                    lifetime = CancellationToken::new();
                    continue;
                }
                let task = Task {
                    api: api.clone(),
                    election_id: election_id.clone(),
                    poll,
                    cancel: lifetime.clone(),
                    event_tx: event_tx.clone(),
                };
                runtime.spawn(async move {
                    task.handle(command).await;
                });
            }
            lifetime.cancel();
        });

        Self { cmd_tx, event_rx }
    }

    pub fn fetch_status(&self, seq: RequestSeq) {
        self.send(EngineCommand::FetchStatus { seq });
    }

    pub fn fetch_jurisdiction_file(&self) {
        self.send(EngineCommand::FetchJurisdictionFile);
    }

    pub fn fetch_board_ballots(
        &self,
        jurisdiction_id: impl Into<String>,
        round_id: impl Into<String>,
        audit_board_id: impl Into<String>,
    ) {
        self.send(EngineCommand::FetchBoardBallots {
            jurisdiction_id: jurisdiction_id.into(),
            round_id: round_id.into(),
            audit_board_id: audit_board_id.into(),
        });
    }

    pub fn run_action(&self, action: AuditAction) {
        self.send(EngineCommand::RunAction(action));
    }

    pub fn start_poll(&self, poll: PollKind) {
        self.send(EngineCommand::StartPoll(poll));
    }

    pub fn cancel_all(&self) {
        self.send(EngineCommand::CancelAll);
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

struct Task {
    api: Arc<dyn AuditApi>,
    election_id: String,
    poll: PollSettings,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Task {
    async fn handle(self, command: EngineCommand) {
        match command {
            EngineCommand::FetchStatus { seq } => {
                let api = self.api.clone();
                let election_id = self.election_id.clone();
                self.report(async move { api.audit_status(&election_id).await }, |result| {
                    EngineEvent::StatusFetched { seq, result }
                })
                .await;
            }
            EngineCommand::FetchJurisdictionFile => {
                let api = self.api.clone();
                let election_id = self.election_id.clone();
                self.report(
                    async move { api.jurisdiction_file(&election_id).await },
                    EngineEvent::JurisdictionFileFetched,
                )
                .await;
            }
            EngineCommand::FetchBoardBallots {
                jurisdiction_id,
                round_id,
                audit_board_id,
            } => {
                let api = self.api.clone();
                let election_id = self.election_id.clone();
                self.report(
                    async move {
                        api.board_ballots(&election_id, &jurisdiction_id, &audit_board_id, &round_id)
                            .await
                    },
                    EngineEvent::BoardBallotsFetched,
                )
                .await;
            }
            EngineCommand::RunAction(action) => {
                let kind = action.kind();
                arlo_info!("running {kind:?}");
                let api = self.api.clone();
                let election_id = self.election_id.clone();
                self.report(
                    async move { api.run_action(&election_id, action).await },
                    |result| EngineEvent::ActionCompleted {
                        action: kind,
                        result,
                    },
                )
                .await;
            }
            EngineCommand::StartPoll(poll) => self.start_poll(poll),
            EngineCommand::CancelAll => {}
        }
    }

    /// Awaits `request` unless the lifetime token fires first; a cancelled
    /// request reports nothing.
    async fn report<T, Fut, E>(&self, request: Fut, into_event: E)
    where
        Fut: Future<Output = Result<T, ApiError>>,
        E: FnOnce(Result<T, ApiError>) -> EngineEvent,
    {
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                arlo_debug!("request cancelled");
                return;
            }
            result = request => result,
        };
        if let Err(err) = &result {
            arlo_warn!("request failed: {err}");
        }
        let _ = self.event_tx.send(into_event(result));
    }

    fn start_poll(self, poll: PollKind) {
        arlo_debug!("starting {poll:?} poll");
        let api = self.api;
        let election_id = self.election_id;
        let done_tx = self.event_tx.clone();
        let timeout_tx = self.event_tx;
        let condition = move || {
            let api = api.clone();
            let election_id = election_id.clone();
            async move { check(api.as_ref(), &election_id, poll).await }
        };
        spawn_poll(
            self.poll,
            &self.cancel,
            condition,
            move || {
                arlo_info!("{poll:?} poll finished");
                let _ = done_tx.send(EngineEvent::PollSettled {
                    poll,
                    result: Ok(()),
                });
            },
            move |err| {
                arlo_warn!("{poll:?} poll gave up: {err}");
                let _ = timeout_tx.send(EngineEvent::PollSettled {
                    poll,
                    result: Err(err),
                });
            },
        );
    }
}

/// One poll check. Request failures count as "not yet".
async fn check(api: &dyn AuditApi, election_id: &str, poll: PollKind) -> bool {
    match poll {
        PollKind::Status(target) => match api.audit_status(election_id).await {
            Ok(snapshot) => target.is_reached(&snapshot),
            Err(err) => {
                arlo_warn!("status check failed: {err}");
                false
            }
        },
        PollKind::JurisdictionFile => match api.jurisdiction_file(election_id).await {
            Ok(status) => status.processing.is_none() || status.is_settled(),
            Err(err) => {
                arlo_warn!("jurisdiction file check failed: {err}");
                false
            }
        },
    }
}
