use std::time::{Duration, Instant};

use arlo_core::{update, AppState, AppViewModel, Msg};
use arlo_logging::{arlo_debug, arlo_warn};
use thiserror::Error;

use crate::effects::EffectRunner;

const IDLE_WAIT: Duration = Duration::from_millis(20);

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no answer from the server within {0:?}")]
    Stalled(Duration),
}

/// Owns the state machine for one mounted view and pumps engine events
/// through `update` until the caller's condition holds.
pub struct Driver {
    state: Option<AppState>,
    runner: EffectRunner,
}

impl Driver {
    pub fn new(state: AppState, runner: EffectRunner) -> Self {
        Self {
            state: Some(state),
            runner,
        }
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let Some(state) = self.state.take() else {
            return;
        };
        if let Msg::StatusLoaded { seq, .. } = &msg {
            if *seq < state.latest_seq() {
                arlo_debug!("dropping stale status response {seq} (latest {})", state.latest_seq());
            }
        }
        let (next, effects) = update(state, msg);
        self.state = Some(next);
        self.runner.run(effects);
    }

    pub fn view(&self) -> Option<AppViewModel> {
        self.state.as_ref().map(AppState::view)
    }

    /// Feeds engine events into the state until `done` holds or `timeout`
    /// passes without it.
    pub fn run_until(
        &mut self,
        timeout: Duration,
        done: impl Fn(&AppState) -> bool,
    ) -> Result<(), DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.state.as_ref().is_some_and(&done) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                arlo_warn!("gave up waiting after {timeout:?}");
                return Err(DriverError::Stalled(timeout));
            }
            if let Some(msg) = self.runner.next_msg(IDLE_WAIT) {
                self.dispatch(msg);
            }
        }
    }

    /// Waits until nothing is loading any more.
    pub fn settle(&mut self, timeout: Duration) -> Result<(), DriverError> {
        self.run_until(timeout, |state| !state.is_loading())
    }

    /// Tears the view down, cancelling everything it started.
    pub fn unmount(mut self) {
        self.dispatch(Msg::Unmounted);
    }
}
