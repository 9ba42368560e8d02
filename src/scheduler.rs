//! Control loop: Kahuna override and random actions.
//!
//! One [`Scheduler::tick`] per poll interval decides what the single
//! [`ActionRunner`] slot should be doing.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       tick(now)                              │
//! │                                                              │
//! │  read KAHUNA_SWITCH                                          │
//! │     │                                                        │
//! │     ├─ LOW  & !override ──▶ cancel + join current run        │
//! │     │                       start Kahuna                     │
//! │     │                                                        │
//! │     ├─ HIGH &  override ──▶ Kahuna alive? keep : clear flags │
//! │     │                                                        │
//! │     └─ !override & interval elapsed ──▶ start random action  │
//! │                                                              │
//! │  run in slot? ──▶ bounded join        : caller sleeps        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Phases, derived from the flags after every step:
//!
//! ```text
//!   Idle ──▶ RunningRandom ──▶ Idle
//!    │            │
//!    ▼            ▼
//!   RunningOverrideStarting ──▶ RunningOverride ──▶ OverrideClearing ──▶ Idle
//! ```

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::actions::Perform;
use crate::app::events::AppEvent;
use crate::app::ports::{ClockPort, DigitalIo, EventSink};
use crate::config::CandyConfig;
use crate::error::Result;
use crate::pins::Pin;
use crate::runner::{ActionRunner, RunReport};

// ═══════════════════════════════════════════════════════════════
//  State
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No run in the slot.
    Idle,
    /// A random action holds the slot.
    RunningRandom,
    /// Override detected; the previous run is being cancelled and joined.
    RunningOverrideStarting,
    /// Kahuna running with the switch held LOW.
    RunningOverride,
    /// Switch released, Kahuna still finishing.
    OverrideClearing,
}

/// Flags owned by the control loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerState {
    /// Override condition latched (switch seen LOW).
    pub override_active: bool,
    /// Kahuna has been launched for the current override span.
    pub override_running: bool,
    /// When the last random action was started.
    pub last_random_action: Duration,
    /// Switch level from the most recent successful read.
    pub switch_low: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
    pub join_timeout: Duration,
    pub random_interval: Duration,
}

impl From<&CandyConfig> for SchedulerConfig {
    fn from(config: &CandyConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            join_timeout: config.join_timeout(),
            random_interval: config.random_interval(),
        }
    }
}

/// What the caller should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Slot empty: sleep one poll interval.
    Idle,
    /// Bounded join timed out; the run is still going.
    Waiting,
    /// A run finished and was cleared.
    Joined,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

pub struct Scheduler<A: Perform> {
    config: SchedulerConfig,
    state: SchedulerState,
    runner: ActionRunner,
    random_actions: Vec<Arc<A>>,
    kahuna: Arc<A>,
    rng: StdRng,
    phase: Phase,
}

impl<A: Perform> Scheduler<A> {
    pub fn new(config: SchedulerConfig, random_actions: Vec<Arc<A>>, kahuna: Arc<A>) -> Self {
        Self {
            config,
            state: SchedulerState::default(),
            runner: ActionRunner::new(),
            random_actions,
            kahuna,
            rng: StdRng::from_entropy(),
            phase: Phase::Idle,
        }
    }

    /// Deterministic random selection.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn runner(&self) -> &ActionRunner {
        &self.runner
    }

    /// One control-loop iteration at monotonic time `now`.
    ///
    /// A failed switch read or action start is returned after the slot has
    /// still been serviced, so a finished run never lingers.
    pub fn tick(
        &mut self,
        now: Duration,
        io: &dyn DigitalIo,
        sink: &mut impl EventSink,
    ) -> Result<TickOutcome> {
        let decided = self.decide(now, io, sink);
        self.note_phase(sink);
        let outcome = self.service_slot(sink);
        debug!(
            "regular poll, override_active = {}",
            self.state.override_active
        );
        decided.map(|()| outcome)
    }

    fn decide(
        &mut self,
        now: Duration,
        io: &dyn DigitalIo,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let switch_high = io.read(Pin::KahunaSwitch)?;
        self.state.switch_low = !switch_high;

        if !switch_high && !self.state.override_active {
            info!("Kahuna event starting");
            self.state.override_active = true;
            if !self.state.override_running {
                self.displace_current(now, sink);
                if let Err(e) = self.runner.start(Arc::clone(&self.kahuna)) {
                    // Unlatch so the next LOW tick retries.
                    self.state.override_active = false;
                    return Err(e);
                }
                self.state.override_running = true;
                sink.emit(&AppEvent::ActionStarted {
                    kind: self.kahuna.kind(),
                    at: now,
                });
            }
        } else if switch_high && self.state.override_active {
            if self.runner.is_running() {
                info!("Kahuna still running, not clearing the flag");
            } else {
                info!("Kahuna event cleared");
                self.state.override_active = false;
                self.state.override_running = false;
            }
        } else if !self.state.override_active && self.random_due(now) {
            self.start_random(now, sink)?;
        }
        Ok(())
    }

    /// Cancel and fully join whatever holds the slot.
    fn displace_current(&mut self, now: Duration, sink: &mut impl EventSink) {
        let Some(kind) = self.runner.current_kind() else {
            return;
        };
        self.runner.request_cancel();
        sink.emit(&AppEvent::CancelRequested { kind, at: now });
        self.note_phase(sink);
        info!("Event set, waiting for action to die");
        if let Some(report) = self.runner.join() {
            self.finished(report, sink);
        }
        info!("Action died, clearing event");
    }

    fn random_due(&self, now: Duration) -> bool {
        now.saturating_sub(self.state.last_random_action) > self.config.random_interval
    }

    fn start_random(&mut self, now: Duration, sink: &mut impl EventSink) -> Result<()> {
        if self.runner.has_run() {
            debug!("previous action still active, deferring random action");
            return Ok(());
        }
        let Some(action) = self.random_actions.choose(&mut self.rng).map(Arc::clone) else {
            warn!("no random actions configured");
            return Ok(());
        };
        let kind = action.kind();
        info!("Time for a random action: {}", kind.name());
        self.runner.start(action)?;
        self.state.last_random_action = now;
        sink.emit(&AppEvent::ActionStarted { kind, at: now });
        Ok(())
    }

    fn service_slot(&mut self, sink: &mut impl EventSink) -> TickOutcome {
        if !self.runner.has_run() {
            return TickOutcome::Idle;
        }
        match self.runner.join_with_timeout(self.config.join_timeout) {
            Some(report) => {
                self.finished(report, sink);
                TickOutcome::Joined
            }
            None => TickOutcome::Waiting,
        }
    }

    fn finished(&mut self, report: RunReport, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::ActionFinished {
            kind: report.kind,
            outcome: report.outcome,
        });
        self.note_phase(sink);
    }

    fn current_phase(&self) -> Phase {
        let s = &self.state;
        if s.override_active {
            if !s.override_running {
                Phase::RunningOverrideStarting
            } else if s.switch_low {
                Phase::RunningOverride
            } else {
                Phase::OverrideClearing
            }
        } else if self.runner.has_run() {
            Phase::RunningRandom
        } else {
            Phase::Idle
        }
    }

    fn note_phase(&mut self, sink: &mut impl EventSink) {
        let to = self.current_phase();
        if to != self.phase {
            let from = self.phase;
            self.phase = to;
            sink.emit(&AppEvent::PhaseChanged { from, to });
        }
    }

    /// Drive ticks until `keep_running` returns `false`, then shut down.
    ///
    /// Sleeps one poll interval when the slot is empty or the tick failed;
    /// otherwise the bounded join already paced the iteration.
    pub fn run(
        &mut self,
        io: &dyn DigitalIo,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
        mut keep_running: impl FnMut() -> bool,
    ) {
        info!("Scheduler: entering control loop");
        while keep_running() {
            match self.tick(clock.now(), io, sink) {
                Ok(TickOutcome::Idle) => clock.sleep(self.config.poll_interval),
                Ok(TickOutcome::Waiting | TickOutcome::Joined) => {}
                Err(e) => {
                    warn!("tick failed: {e}");
                    sink.emit(&AppEvent::TickFailed(e));
                    clock.sleep(self.config.poll_interval);
                }
            }
        }
        self.shutdown(sink);
    }

    /// Cancel and join any run so no action outlives the loop.
    pub fn shutdown(&mut self, sink: &mut impl EventSink) {
        if let Some(kind) = self.runner.current_kind() {
            info!("Scheduler: shutting down, stopping {}", kind.name());
            self.runner.request_cancel();
            if let Some(report) = self.runner.join() {
                sink.emit(&AppEvent::ActionFinished {
                    kind: report.kind,
                    outcome: report.outcome,
                });
            }
        }
        self.state.override_active = false;
        self.state.override_running = false;
        self.note_phase(sink);
        info!("Scheduler: stopped");
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
