use std::future::Future;
use std::time::Duration;

use arlo_logging::{arlo_debug, arlo_trace};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::PollError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(120_000),
            interval: Duration::from_millis(1_000),
        }
    }
}

/// Evaluates `condition` now and then once per interval until it returns
/// true, the deadline passes, or `cancel` fires.
///
/// A check that began at or after the deadline and came back false ends the
/// poll with [`PollError::Timeout`]. Each check is awaited before the next
/// interval starts, so checks never overlap.
pub async fn poll_until<F, Fut>(
    settings: PollSettings,
    cancel: &CancellationToken,
    mut condition: F,
) -> Result<(), PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + settings.timeout;
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let started = Instant::now();
        let done = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            done = condition() => done,
        };
        arlo_trace!("poll attempt {attempt}: {done}");
        if done {
            return Ok(());
        }
        if started >= deadline {
            return Err(PollError::Timeout);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            _ = sleep(settings.interval) => {}
        }
    }
}

/// A running poll. Dropping the handle leaves the poll running.
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<Result<(), PollError>>,
}

impl PollHandle {
    /// Stops the poll. Neither callback fires afterwards.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the poll's single settled result.
    pub async fn settled(self) -> Result<(), PollError> {
        self.task.await.unwrap_or(Err(PollError::Cancelled))
    }
}

/// Spawns a poll that calls `on_done` or `on_timeout` exactly once when it
/// settles. Cancelling `parent` (or the returned handle) settles it silently.
///
/// Must be called from within a tokio runtime.
pub fn spawn_poll<C, Fut, D, T>(
    settings: PollSettings,
    parent: &CancellationToken,
    condition: C,
    on_done: D,
    on_timeout: T,
) -> PollHandle
where
    C: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send + 'static,
    D: FnOnce() + Send + 'static,
    T: FnOnce(PollError) + Send + 'static,
{
    let cancel = parent.child_token();
    let token = cancel.clone();
    let task = tokio::spawn(async move {
        let result = poll_until(settings, &token, condition).await;
        match result {
            Ok(()) => on_done(),
            Err(PollError::Timeout) => on_timeout(PollError::Timeout),
            Err(PollError::Cancelled) => arlo_debug!("poll cancelled"),
        }
        result
    });
    PollHandle { cancel, task }
}
