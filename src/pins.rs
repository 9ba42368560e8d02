//! GPIO pin assignments for the candy machine board.
//!
//! Single source of truth: adapters map the symbolic [`Pin`] to a BCM line
//! number here and nowhere else.

use core::fmt;

// ---------------------------------------------------------------------------
// Optical sensors (configured at startup, unused at runtime)
// ---------------------------------------------------------------------------

pub const OPTO_1_GPIO: u8 = 17;
pub const OPTO_2_GPIO: u8 = 21;

// ---------------------------------------------------------------------------
// Relays
// ---------------------------------------------------------------------------

/// Smoke machine relay.
pub const RELAY_1_GPIO: u8 = 18;
pub const RELAY_2_GPIO: u8 = 23;

// ---------------------------------------------------------------------------
// Bubble machine output
// ---------------------------------------------------------------------------

pub const BUBBLE_MACHINE_GPIO: u8 = 25;

// ---------------------------------------------------------------------------
// Kahuna switch (active-low input)
// ---------------------------------------------------------------------------

/// LOW = override requested, HIGH = released.
pub const KAHUNA_SWITCH_GPIO: u8 = 22;

/// Symbolic identity of every digital line the controller touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pin {
    Opto1,
    Opto2,
    Relay1,
    Relay2,
    BubbleMachine,
    KahunaSwitch,
}

/// Line direction applied once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Every pin with the direction it is configured in at startup.
pub const LAYOUT: [(Pin, Direction); 6] = [
    (Pin::BubbleMachine, Direction::Output),
    (Pin::Relay1, Direction::Output),
    (Pin::Relay2, Direction::Output),
    (Pin::Opto1, Direction::Output),
    (Pin::Opto2, Direction::Output),
    (Pin::KahunaSwitch, Direction::Input),
];

impl Pin {
    /// BCM line number.
    pub const fn bcm(self) -> u8 {
        match self {
            Self::Opto1 => OPTO_1_GPIO,
            Self::Opto2 => OPTO_2_GPIO,
            Self::Relay1 => RELAY_1_GPIO,
            Self::Relay2 => RELAY_2_GPIO,
            Self::BubbleMachine => BUBBLE_MACHINE_GPIO,
            Self::KahunaSwitch => KAHUNA_SWITCH_GPIO,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Opto1 => "OPTO_1",
            Self::Opto2 => "OPTO_2",
            Self::Relay1 => "RELAY_1",
            Self::Relay2 => "RELAY_2",
            Self::BubbleMachine => "BUBBLE_MACHINE",
            Self::KahunaSwitch => "KAHUNA_SWITCH",
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (BCM{})", self.name(), self.bcm())
    }
}
