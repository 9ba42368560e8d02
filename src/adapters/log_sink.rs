//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the log, which ends up in the daemon's log file.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::runner::RunOutcome;

/// Adapter that logs every [`AppEvent`].
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::PhaseChanged { from, to } => {
                info!("PHASE | {:?} -> {:?}", from, to);
            }
            AppEvent::ActionStarted { kind, at } => {
                info!("START | {} at {:.1}s", kind.name(), at.as_secs_f32());
            }
            AppEvent::CancelRequested { kind, at } => {
                info!("CANCEL | {} at {:.1}s", kind.name(), at.as_secs_f32());
            }
            AppEvent::ActionFinished { kind, outcome } => match outcome {
                RunOutcome::Completed | RunOutcome::Cancelled => {
                    info!("DONE | {} {:?}", kind.name(), outcome);
                }
                RunOutcome::Failed(e) => warn!("DONE | {} failed: {}", kind.name(), e),
                RunOutcome::Panicked => warn!("DONE | {} panicked", kind.name()),
            },
            AppEvent::TickFailed(e) => {
                warn!("TICK | {}", e);
            }
        }
    }
}
