//! Candy machine controller — main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioBank / SimulatedIo   MixerSound / LoggingSound            │
//! │  (DigitalIo)              (SoundPort)                          │
//! │  MonotonicClock           LogEventSink                         │
//! │  (ClockPort)              (EventSink)                          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Scheduler ──▶ ActionRunner ──▶ Action (own thread)    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Result;
use log::info;

use candymachine::actions::{Catalog, Stage};
use candymachine::adapters::log_sink::LogEventSink;
use candymachine::adapters::time::MonotonicClock;
use candymachine::app::ports::{DigitalIo, SoundPort};
use candymachine::config::CandyConfig;
use candymachine::diagnostics;
use candymachine::scheduler::{Scheduler, SchedulerConfig};

fn main() -> Result<()> {
    let config = CandyConfig::default();

    // Must stay alive until exit so buffered log lines are flushed.
    let _log_guard = diagnostics::init_logging(&config.log_file)?;
    diagnostics::install_panic_handler();
    let running = diagnostics::install_stop_handler()?;

    info!("Candy machine v{} starting", env!("CARGO_PKG_VERSION"));
    info!("config: {}", serde_json::to_string(&config)?);

    let (io, sound) = bring_up(&config)?;
    let catalog = Catalog::new(&config, Stage::new(Arc::clone(&io), sound));
    let mut scheduler = Scheduler::new(
        SchedulerConfig::from(&config),
        catalog.random,
        catalog.kahuna,
    );

    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();

    info!("System ready. Entering control loop.");
    scheduler.run(io.as_ref(), &clock, &mut sink, || {
        running.load(Ordering::SeqCst)
    });

    // The actions share the pin bank; drop them so `io` is the last owner.
    drop(scheduler);
    info!("Candy machine stopped");
    Ok(())
}

// ── Peripheral bring-up ───────────────────────────────────────

#[cfg(feature = "hardware")]
fn bring_up(config: &CandyConfig) -> Result<(Arc<dyn DigitalIo>, Arc<dyn SoundPort>)> {
    use anyhow::Context;
    use candymachine::adapters::{gpio, sound::MixerSound};

    let io: Arc<dyn DigitalIo> = Arc::new(gpio::configure_rpi().context("GPIO bring-up failed")?);
    let sound: Arc<dyn SoundPort> =
        Arc::new(MixerSound::open(&config.sound_dir).context("audio bring-up failed")?);
    Ok((io, sound))
}

#[cfg(not(feature = "hardware"))]
fn bring_up(_config: &CandyConfig) -> Result<(Arc<dyn DigitalIo>, Arc<dyn SoundPort>)> {
    use candymachine::adapters::sim::{LoggingSound, SimulatedIo};

    log::warn!("built without the `hardware` feature: pins and sound are simulated");
    let io: Arc<dyn DigitalIo> = Arc::new(SimulatedIo::new());
    let sound: Arc<dyn SoundPort> = Arc::new(LoggingSound);
    Ok((io, sound))
}
