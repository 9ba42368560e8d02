//! Outbound application events.
//!
//! The [`Scheduler`](crate::scheduler::Scheduler) emits these through the
//! [`EventSink`](super::ports::EventSink) port. The production adapter logs
//! them; tests record them.

use std::time::Duration;

use crate::actions::ActionKind;
use crate::error::Error;
use crate::runner::RunOutcome;
use crate::scheduler::Phase;

/// Structured events emitted by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The scheduler moved between phases.
    PhaseChanged { from: Phase, to: Phase },

    /// An action was launched on its own thread.
    ActionStarted { kind: ActionKind, at: Duration },

    /// Cancellation was requested on a running action to make way for
    /// the override.
    CancelRequested { kind: ActionKind, at: Duration },

    /// A run was joined and cleared.
    ActionFinished { kind: ActionKind, outcome: RunOutcome },

    /// A tick failed; the loop keeps polling.
    TickFailed(Error),
}
