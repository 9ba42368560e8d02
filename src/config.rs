//! System configuration parameters
//!
//! All tunable parameters for the candy machine. There is no config file:
//! [`CandyConfig::default`] is the only source, and the effective values are
//! logged at startup.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandyConfig {
    // --- Timing ---
    /// Control loop poll interval (milliseconds)
    pub poll_interval_ms: u64,
    /// Upper bound for the per-tick join on a running action (milliseconds)
    pub join_timeout_ms: u64,
    /// Minimum gap between two random actions (milliseconds)
    pub random_interval_ms: u64,

    // --- Actions ---
    /// Run time of the bubble, smoke and bleep actions (milliseconds)
    pub effect_duration_ms: u64,
    /// Run time of the Kahuna bonus action (milliseconds)
    pub kahuna_duration_ms: u64,

    // --- Paths ---
    /// Log file written by the daemon
    pub log_file: PathBuf,
    /// Directory holding the WAV assets, relative to the working directory
    pub sound_dir: PathBuf,
}

impl Default for CandyConfig {
    fn default() -> Self {
        Self {
            // Timing
            poll_interval_ms: 1_000,
            join_timeout_ms: 1_000,
            random_interval_ms: 30_000,

            // Actions
            effect_duration_ms: 10_000,
            kahuna_duration_ms: 30_000,

            // Paths
            log_file: PathBuf::from("/var/log/candymachine.log"),
            sound_dir: PathBuf::from("soundeffects"),
        }
    }
}

impl CandyConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    pub fn random_interval(&self) -> Duration {
        Duration::from_millis(self.random_interval_ms)
    }

    pub fn effect_duration(&self) -> Duration {
        Duration::from_millis(self.effect_duration_ms)
    }

    pub fn kahuna_duration(&self) -> Duration {
        Duration::from_millis(self.kahuna_duration_ms)
    }
}
