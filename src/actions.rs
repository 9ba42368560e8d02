//! The fixed action catalog.
//!
//! | Kind            | Output pin         | Sound   | Duration |
//! |-----------------|--------------------|---------|----------|
//! | `BubbleMachine` | `BUBBLE_MACHINE`   | bubbles | effect   |
//! | `SmokeMachine`  | `RELAY_1`          | siren   | effect   |
//! | `Bleeping`      | none               | bleep   | effect   |
//! | `Kahuna`        | none               | none    | kahuna   |
//!
//! Every action follows the same shape: start sound, drive pin HIGH, wait
//! (cancellable) for its duration, drive pin LOW, stop sound. Teardown runs
//! on every exit path once the action has started.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::app::ports::{DigitalIo, Effect, SoundPort};
use crate::config::CandyConfig;
use crate::error::Result;
use crate::pins::Pin;
use crate::runner::CancelToken;

/// Closed set of things the machine can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    BubbleMachine,
    SmokeMachine,
    Bleeping,
    Kahuna,
}

impl ActionKind {
    /// The kinds eligible for random selection.
    pub const RANDOM: [Self; 3] = [Self::BubbleMachine, Self::SmokeMachine, Self::Bleeping];

    pub const fn name(self) -> &'static str {
        match self {
            Self::BubbleMachine => "BubbleMachine",
            Self::SmokeMachine => "SmokeMachine",
            Self::Bleeping => "Bleeping",
            Self::Kahuna => "Kahuna",
        }
    }

    pub const fn pin(self) -> Option<Pin> {
        match self {
            Self::BubbleMachine => Some(Pin::BubbleMachine),
            Self::SmokeMachine => Some(Pin::Relay1),
            Self::Bleeping | Self::Kahuna => None,
        }
    }

    pub const fn effect(self) -> Option<Effect> {
        match self {
            Self::BubbleMachine => Some(Effect::Bubbles),
            Self::SmokeMachine => Some(Effect::Siren),
            Self::Bleeping => Some(Effect::Bleep),
            Self::Kahuna => None,
        }
    }
}

/// How `perform` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

/// Something the [`ActionRunner`](crate::runner::ActionRunner) can execute.
///
/// `perform` blocks the calling thread for the action's duration and must
/// return promptly once `cancel` fires.
pub trait Perform: Send + Sync + 'static {
    fn kind(&self) -> ActionKind;

    fn perform(&self, cancel: &CancelToken) -> Result<Outcome>;
}

/// Shared hardware handles every action drives.
#[derive(Clone)]
pub struct Stage {
    io: Arc<dyn DigitalIo>,
    sound: Arc<dyn SoundPort>,
}

impl Stage {
    pub fn new(io: Arc<dyn DigitalIo>, sound: Arc<dyn SoundPort>) -> Self {
        Self { io, sound }
    }
}

pub struct Action {
    kind: ActionKind,
    duration: Duration,
    stage: Stage,
}

impl Action {
    pub fn new(kind: ActionKind, duration: Duration, stage: Stage) -> Self {
        Self {
            kind,
            duration,
            stage,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Perform for Action {
    fn kind(&self) -> ActionKind {
        self.kind
    }

    fn perform(&self, cancel: &CancelToken) -> Result<Outcome> {
        let name = self.kind.name();
        let pin = self.kind.pin();
        let effect = self.kind.effect();
        info!("{name} started");

        if let Some(effect) = effect {
            self.stage.sound.start(effect);
        }
        let activated = match pin {
            Some(pin) => self.stage.io.activate(pin),
            None => Ok(()),
        };
        // Skip the wait if the output never came up; teardown still runs.
        let outcome = activated.map(|()| {
            if cancel.wait_timeout(self.duration) {
                Outcome::Cancelled
            } else {
                Outcome::Completed
            }
        });

        let released = match pin {
            Some(pin) => self.stage.io.deactivate(pin),
            None => Ok(()),
        };
        if let Err(e) = &released {
            warn!("{name}: {e}");
        }
        if let Some(effect) = effect {
            self.stage.sound.stop(effect);
        }
        info!("{name} stopped");

        let outcome = outcome?;
        released?;
        Ok(outcome)
    }
}

/// Actions built once at startup and reused for every invocation.
pub struct Catalog {
    pub random: Vec<Arc<Action>>,
    pub kahuna: Arc<Action>,
}

impl Catalog {
    pub fn new(config: &CandyConfig, stage: Stage) -> Self {
        let random = ActionKind::RANDOM
            .iter()
            .map(|&kind| Arc::new(Action::new(kind, config.effect_duration(), stage.clone())))
            .collect();
        let kahuna = Arc::new(Action::new(
            ActionKind::Kahuna,
            config.kahuna_duration(),
            stage,
        ));
        Self { random, kahuna }
    }
}
