//! Logging bring-up and crash reporting.
//!
//! The crate logs through the `log` facade. [`init_logging`] installs a
//! `tracing-subscriber` formatter that also captures `log` records and
//! writes them, non-blocking, to the configured log file. The returned
//! guard must live until exit or buffered lines are lost.
//!
//! [`install_stop_handler`] turns SIGINT/SIGTERM into a flag the control
//! loop polls, so shutdown runs and every pin is released on exit.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "debug";

/// Route all log output to `log_file` (appending, never rotated).
pub fn init_logging(log_file: &Path) -> anyhow::Result<WorkerGuard> {
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = log_file
        .file_name()
        .with_context(|| format!("log path {} has no file name", log_file.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy().into_owned())
        .build(dir)
        .with_context(|| format!("cannot open log file {}", log_file.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| anyhow!("logger already installed: {e}"))?;

    Ok(guard)
}

// ───────────────────────────────────────────────────────────────
// Stop signal
// ───────────────────────────────────────────────────────────────

/// Clear the returned flag on SIGINT or SIGTERM.
///
/// Only one handler can be installed per process.
pub fn install_stop_handler() -> anyhow::Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("stop signal received, shutting down");
        flag.store(false, Ordering::SeqCst);
    })
    .context("cannot install SIGINT/SIGTERM handler")?;
    Ok(running)
}

// ───────────────────────────────────────────────────────────────
// Custom panic handler
// ───────────────────────────────────────────────────────────────

/// Install a panic hook that records the panic reason and thread in the
/// log before the default unwinding continues.
///
/// Must be called once during init, after logging is up.
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        let thread = std::thread::current();
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();

        log::error!(
            "PANIC in '{}': {} {}",
            thread.name().unwrap_or("<unnamed>"),
            reason,
            location
        );
    }));
}
