//! Unified error types for the candy machine controller.
//!
//! A single `Error` enum that every subsystem converts into, so the control
//! loop can handle per-tick failures uniformly and `main` can report fatal
//! startup failures through `anyhow`.

use core::fmt;

use crate::pins::Pin;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An action was started while another one was still active.
    AlreadyRunning,
    /// A digital I/O line could not be read or written.
    HardwareIo(IoError),
    /// The audio subsystem could not be brought up.
    AudioInit(AudioError),
    /// An action thread could not be spawned.
    Spawn(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "an action is already running"),
            Self::HardwareIo(e) => write!(f, "hardware I/O: {e}"),
            Self::AudioInit(e) => write!(f, "audio init: {e}"),
            Self::Spawn(msg) => write!(f, "thread spawn failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Digital I/O errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// Reading an input line failed.
    ReadFailed(Pin),
    /// Driving an output line failed.
    WriteFailed(Pin),
    /// The pin was never configured in the requested direction.
    NotConfigured(Pin),
    /// Another thread panicked while holding the pin bank.
    LockPoisoned,
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed(pin) => write!(f, "read of {pin} failed"),
            Self::WriteFailed(pin) => write!(f, "write to {pin} failed"),
            Self::NotConfigured(pin) => write!(f, "{pin} not configured"),
            Self::LockPoisoned => write!(f, "pin bank lock poisoned"),
        }
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Self::HardwareIo(e)
    }
}

// ---------------------------------------------------------------------------
// Audio errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// A sound asset is missing or could not be decoded.
    Asset { path: String, reason: String },
    /// The output routing command failed to run.
    Routing(String),
    /// No usable output device or stream.
    Device(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asset { path, reason } => write!(f, "asset {path}: {reason}"),
            Self::Routing(msg) => write!(f, "output routing: {msg}"),
            Self::Device(msg) => write!(f, "output device: {msg}"),
        }
    }
}

impl std::error::Error for AudioError {}

impl From<AudioError> for Error {
    fn from(e: AudioError) -> Self {
        Self::AudioInit(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
