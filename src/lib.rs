//! Candy machine controller library.
//!
//! Exposes the control loop, action catalog and adapters for the binary
//! and for integration testing. Raspberry Pi peripherals are only compiled
//! in with the `hardware` feature.

#![deny(unused_must_use)]

pub mod actions;
pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pins;
pub mod runner;
pub mod scheduler;
