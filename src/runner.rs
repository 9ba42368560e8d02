//! Single-slot action runner with cooperative cancellation.
//!
//! ```text
//!   start(action) ──▶ spawn "action-<name>" thread ──▶ perform(cancel)
//!                                                        │
//!   request_cancel() ──▶ CancelToken ──(wakes wait)──────┘
//!                                                        │
//!   join_with_timeout(d) ◀── completion channel ◀────────┘
//! ```
//!
//! The runner holds at most one [`ActionRun`]. A second `start` while a run
//! occupies the slot fails with [`Error::AlreadyRunning`]; the slot is only
//! freed once the run has been joined. Every run gets its own
//! [`CancelToken`], so a cancellation never leaks into the next action.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, warn};

use crate::actions::{ActionKind, Outcome, Perform};
use crate::error::{Error, Result};

// ───────────────────────────────────────────────────────────────
// Cancellation signal
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Signal {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

/// Cooperative cancellation signal shared between the control loop and
/// one action thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Signal>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        let mut cancelled = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !*cancelled {
            *cancelled = true;
            self.inner.cond.notify_all();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for up to `timeout` or until cancelled, whichever comes first.
    /// Returns `true` if cancellation was requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .inner
            .cond
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

// ───────────────────────────────────────────────────────────────
// Run bookkeeping
// ───────────────────────────────────────────────────────────────

/// How a joined run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Waited out its full duration.
    Completed,
    /// Returned early because cancellation was requested.
    Cancelled,
    /// `perform` returned an error (teardown was still attempted).
    Failed(Error),
    /// The action thread panicked.
    Panicked,
}

impl From<Result<Outcome>> for RunOutcome {
    fn from(result: Result<Outcome>) -> Self {
        match result {
            Ok(Outcome::Completed) => Self::Completed,
            Ok(Outcome::Cancelled) => Self::Cancelled,
            Err(e) => Self::Failed(e),
        }
    }
}

/// Summary handed back when a run is joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub kind: ActionKind,
    pub outcome: RunOutcome,
}

/// One execution of an action on its own thread.
struct ActionRun {
    kind: ActionKind,
    cancel: CancelToken,
    done: Receiver<RunOutcome>,
    handle: JoinHandle<()>,
}

// ───────────────────────────────────────────────────────────────
// ActionRunner
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ActionRunner {
    current: Option<ActionRun>,
}

impl ActionRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch `action` on a fresh thread.
    pub fn start<A: Perform>(&mut self, action: Arc<A>) -> Result<()> {
        if self.current.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let kind = action.kind();
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let (done_tx, done) = crossbeam_channel::bounded(1);

        let handle = thread::Builder::new()
            .name(format!("action-{}", kind.name()))
            .spawn(move || {
                let result = action.perform(&token);
                if let Err(e) = &result {
                    warn!("{} failed: {}", kind.name(), e);
                }
                // The runner may already be gone during shutdown.
                let _ = done_tx.send(RunOutcome::from(result));
            })
            .map_err(|e| Error::Spawn(e.to_string()))?;

        debug!("runner: {} launched", kind.name());
        self.current = Some(ActionRun {
            kind,
            cancel,
            done,
            handle,
        });
        Ok(())
    }

    /// Ask the current run to stop at its next wait boundary. Idempotent;
    /// no-op when nothing is running.
    pub fn request_cancel(&self) {
        if let Some(run) = &self.current {
            run.cancel.cancel();
        }
    }

    /// Whether the current run's thread is still executing.
    pub fn is_running(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|run| !run.handle.is_finished())
    }

    /// Whether the slot is occupied (running, or finished but not joined).
    pub fn has_run(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_kind(&self) -> Option<ActionKind> {
        self.current.as_ref().map(|run| run.kind)
    }

    /// Wait up to `timeout` for the current run. Returns its report and
    /// frees the slot if it finished, `None` if it is still going (or there
    /// is no run).
    pub fn join_with_timeout(&mut self, timeout: Duration) -> Option<RunReport> {
        let outcome = match self.current.as_ref()?.done.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => RunOutcome::Panicked,
        };
        self.current.take().map(|run| Self::reap(run, outcome))
    }

    /// Block until the current run finishes.
    pub fn join(&mut self) -> Option<RunReport> {
        let run = self.current.take()?;
        let outcome = run.done.recv().unwrap_or(RunOutcome::Panicked);
        Some(Self::reap(run, outcome))
    }

    fn reap(run: ActionRun, outcome: RunOutcome) -> RunReport {
        let outcome = match run.handle.join() {
            Ok(()) => outcome,
            Err(_) => RunOutcome::Panicked,
        };
        debug!("runner: {} joined ({:?})", run.kind.name(), outcome);
        RunReport {
            kind: run.kind,
            outcome,
        }
    }
}

impl Drop for ActionRunner {
    fn drop(&mut self) {
        if let Some(run) = self.current.take() {
            run.cancel.cancel();
            let _ = run.handle.join();
        }
    }
}
