//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Scheduler / Actions (domain)
//! ```
//!
//! Driven adapters (GPIO, audio, clock, event sinks) implement these traits.
//! The domain core never touches hardware directly.
//!
//! [`DigitalIo`] and [`SoundPort`] take `&self` because one instance is
//! shared between the control loop (which reads the switch) and whichever
//! action thread is currently running. Implementations synchronise
//! internally.

use std::time::Duration;

use crate::error::IoError;
use crate::pins::Pin;

// ───────────────────────────────────────────────────────────────
// Digital I/O port
// ───────────────────────────────────────────────────────────────

/// Runtime access to the configured digital lines.
pub trait DigitalIo: Send + Sync {
    /// Drive an output HIGH.
    fn activate(&self, pin: Pin) -> Result<(), IoError>;

    /// Drive an output LOW.
    fn deactivate(&self, pin: Pin) -> Result<(), IoError>;

    /// Sample an input. `true` = HIGH.
    fn read(&self, pin: Pin) -> Result<bool, IoError>;
}

// ───────────────────────────────────────────────────────────────
// Sound port
// ───────────────────────────────────────────────────────────────

/// The three looping sound effects of the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Bubbles,
    Siren,
    Bleep,
}

impl Effect {
    pub const ALL: [Self; 3] = [Self::Bubbles, Self::Siren, Self::Bleep];

    /// Asset file name inside the sound directory.
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Bubbles => "Bubbling-SoundBible.com-1684132696.wav",
            Self::Siren => "police_s.wav",
            Self::Bleep => "bleep_01.wav",
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Bubbles => 0,
            Self::Siren => 1,
            Self::Bleep => 2,
        }
    }
}

/// Looping playback of preloaded effects.
pub trait SoundPort: Send + Sync {
    /// Start `effect` from the beginning and loop it until stopped.
    fn start(&self, effect: Effect);

    /// Silence `effect`. No-op if it is not playing.
    fn stop(&self, effect: Effect);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source for the control loop.
pub trait ClockPort {
    /// Time since the controller started.
    fn now(&self) -> Duration;

    /// Block the control loop for `period`.
    fn sleep(&self, period: Duration);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The scheduler emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
