//! GPIO adapter — maps symbolic [`Pin`]s onto `embedded-hal` digital lines.
//!
//! The bank is generic over the HAL pin types so the same code drives the
//! Raspberry Pi (via `rppal`, behind the `hardware` feature) and the mock
//! pins used in tests. Lines are configured once at startup; rppal resets
//! them to their previous mode when the bank is dropped.

use std::sync::Mutex;

use embedded_hal::digital::{Error as _, InputPin, OutputPin};
use log::{debug, warn};

use crate::app::ports::DigitalIo;
use crate::error::IoError;
use crate::pins::Pin;

/// Configured output and input lines, each behind its own lock.
pub struct GpioBank<O, I> {
    outputs: Mutex<Vec<(Pin, O)>>,
    inputs: Mutex<Vec<(Pin, I)>>,
}

impl<O: OutputPin, I: InputPin> GpioBank<O, I> {
    pub fn new(outputs: Vec<(Pin, O)>, inputs: Vec<(Pin, I)>) -> Self {
        Self {
            outputs: Mutex::new(outputs),
            inputs: Mutex::new(inputs),
        }
    }

    fn write(&self, pin: Pin, high: bool) -> Result<(), IoError> {
        let mut outputs = self.outputs.lock().map_err(|_| IoError::LockPoisoned)?;
        let (_, line) = outputs
            .iter_mut()
            .find(|(p, _)| *p == pin)
            .ok_or(IoError::NotConfigured(pin))?;
        let result = if high { line.set_high() } else { line.set_low() };
        result.map_err(|e| {
            warn!("gpio: write to {pin} failed ({:?})", e.kind());
            IoError::WriteFailed(pin)
        })
    }
}

impl<O, I> DigitalIo for GpioBank<O, I>
where
    O: OutputPin + Send,
    I: InputPin + Send,
{
    fn activate(&self, pin: Pin) -> Result<(), IoError> {
        debug!("Setting port {pin} HIGH");
        self.write(pin, true)
    }

    fn deactivate(&self, pin: Pin) -> Result<(), IoError> {
        debug!("Setting port {pin} LOW");
        self.write(pin, false)
    }

    fn read(&self, pin: Pin) -> Result<bool, IoError> {
        let mut inputs = self.inputs.lock().map_err(|_| IoError::LockPoisoned)?;
        let (_, line) = inputs
            .iter_mut()
            .find(|(p, _)| *p == pin)
            .ok_or(IoError::NotConfigured(pin))?;
        line.is_high().map_err(|e| {
            warn!("gpio: read of {pin} failed ({:?})", e.kind());
            IoError::ReadFailed(pin)
        })
    }
}

// ── Raspberry Pi bring-up ──────────────────────────────────────

#[cfg(feature = "hardware")]
pub type RpiGpio = GpioBank<rppal::gpio::OutputPin, rppal::gpio::InputPin>;

/// Claim every line in [`LAYOUT`](crate::pins::LAYOUT), outputs LOW.
#[cfg(feature = "hardware")]
pub fn configure_rpi() -> Result<RpiGpio, rppal::gpio::Error> {
    use crate::pins::{Direction, LAYOUT};
    use log::info;

    let gpio = rppal::gpio::Gpio::new()?;
    let mut outputs = Vec::new();
    let mut inputs = Vec::new();
    for (pin, direction) in LAYOUT {
        let line = gpio.get(pin.bcm())?;
        match direction {
            Direction::Output => outputs.push((pin, line.into_output_low())),
            Direction::Input => inputs.push((pin, line.into_input())),
        }
        info!("gpio: {pin} configured as {direction:?}");
    }
    Ok(GpioBank::new(outputs, inputs))
}
