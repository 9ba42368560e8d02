//! Simulation adapters for host builds without the `hardware` feature.
//!
//! Every pin change is logged instead of driven. The Kahuna switch idles
//! HIGH (released), so a simulated run only exercises random actions;
//! tests press it with [`SimulatedIo::set_level`].

use std::collections::HashMap;
use std::sync::Mutex;

use log::{debug, info};

use crate::app::ports::{DigitalIo, Effect, SoundPort};
use crate::error::IoError;
use crate::pins::{Direction, LAYOUT, Pin};

pub struct SimulatedIo {
    levels: Mutex<HashMap<Pin, bool>>,
}

impl Default for SimulatedIo {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedIo {
    pub fn new() -> Self {
        info!("Init ports (simulated)");
        let levels = LAYOUT
            .iter()
            .map(|&(pin, direction)| {
                debug!("sim: {pin} configured as {direction:?}");
                (pin, direction == Direction::Input)
            })
            .collect();
        Self {
            levels: Mutex::new(levels),
        }
    }

    /// Force a line level, e.g. to press the Kahuna switch.
    pub fn set_level(&self, pin: Pin, high: bool) -> Result<(), IoError> {
        self.store(pin, high)
    }

    pub fn level(&self, pin: Pin) -> Option<bool> {
        self.levels.lock().ok()?.get(&pin).copied()
    }

    fn store(&self, pin: Pin, high: bool) -> Result<(), IoError> {
        let mut levels = self.levels.lock().map_err(|_| IoError::LockPoisoned)?;
        let level = levels.get_mut(&pin).ok_or(IoError::NotConfigured(pin))?;
        *level = high;
        Ok(())
    }
}

impl DigitalIo for SimulatedIo {
    fn activate(&self, pin: Pin) -> Result<(), IoError> {
        debug!("Setting port {pin} HIGH");
        self.store(pin, true)
    }

    fn deactivate(&self, pin: Pin) -> Result<(), IoError> {
        debug!("Setting port {pin} LOW");
        self.store(pin, false)
    }

    fn read(&self, pin: Pin) -> Result<bool, IoError> {
        self.level(pin).ok_or(IoError::NotConfigured(pin))
    }
}

impl Drop for SimulatedIo {
    fn drop(&mut self) {
        debug!("Cleanup ports (simulated)");
    }
}

/// Sound port that only logs.
pub struct LoggingSound;

impl SoundPort for LoggingSound {
    fn start(&self, effect: Effect) {
        info!("sound: {} looping (simulated)", effect.file_name());
    }

    fn stop(&self, effect: Effect) {
        info!("sound: {} stopped (simulated)", effect.file_name());
    }
}
