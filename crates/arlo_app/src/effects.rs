use std::time::Duration;

use arlo_core::{Effect, Msg, PollOutcome};
use arlo_engine::{EngineEvent, EngineHandle, PollError};
use arlo_logging::{arlo_debug, arlo_info};

/// Carries core effects to the engine and engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchStatus { seq } => {
                    arlo_debug!("FetchStatus seq={seq}");
                    self.engine.fetch_status(seq);
                }
                Effect::FetchJurisdictionFile => self.engine.fetch_jurisdiction_file(),
                Effect::FetchBoardBallots {
                    jurisdiction_id,
                    round_id,
                    audit_board_id,
                } => self
                    .engine
                    .fetch_board_ballots(jurisdiction_id, round_id, audit_board_id),
                Effect::RunAction(action) => self.engine.run_action(action),
                Effect::StartPoll(poll) => self.engine.start_poll(poll),
                Effect::CancelAll => self.engine.cancel_all(),
                Effect::Navigate(path) => arlo_info!("navigate to {path}"),
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(event_to_msg)
    }
}

pub fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::StatusFetched { seq, result } => Msg::StatusLoaded {
            seq,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::JurisdictionFileFetched(result) => {
            Msg::JurisdictionFileLoaded(result.map_err(|err| err.to_string()))
        }
        EngineEvent::BoardBallotsFetched(result) => {
            Msg::BoardBallotsLoaded(result.map_err(|err| err.to_string()))
        }
        EngineEvent::ActionCompleted { action, result } => Msg::ActionFinished {
            action,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::PollSettled { poll, result } => match result {
            Ok(()) => Msg::PollSettled {
                poll,
                outcome: PollOutcome::Done,
            },
            Err(PollError::Timeout) => Msg::PollSettled {
                poll,
                outcome: PollOutcome::TimedOut,
            },
            Err(PollError::Cancelled) => Msg::NoOp,
        },
    }
}
