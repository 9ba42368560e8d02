//! Application boundary — port traits and outbound events.
//!
//! All interaction with hardware happens through the **port traits** in
//! [`ports`], keeping the scheduler and actions testable without real
//! peripherals.

pub mod events;
pub mod ports;
