// src/logging.rs

//! Logging setup for `aldev` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `--verbose` (debug)
//! 3. `ALDEV_LOG` environment variable (e.g. "info", "debug")
//! 4. default to `info`
//!
//! Logs are sent to STDERR so that the output of the supervised tools
//! (tilt, kubectl, go...) keeps STDOUT for itself.

use std::backtrace::Backtrace;
use std::fmt::Display;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info};
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Time left to the other tasks to finish up after a fatal error.
pub const FATAL_EXIT_DELAY: Duration = Duration::from_secs(2);

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, verbose: bool) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None if verbose => tracing::Level::DEBUG,
        None => std::env::var("ALDEV_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Log a user-facing milestone, framed so it stands out between the
/// output of the supervised tools.
pub fn step(msg: impl Display) {
    let msg = msg.to_string();
    let sep = "-".repeat(msg.chars().count().min(100));
    info!("{sep}");
    info!("{msg}");
    info!("{sep}");
}

/// The single fatal-error path, called by `main` before exiting with 1.
///
/// Logs the error chain and a backtrace, then waits a bit so the tasks
/// still winding down (teardown commands, rollbacks) can finish. Commands
/// owning a [`Lifecycle`](crate::lifecycle::Lifecycle) cancel it before
/// handing their error up.
pub async fn fatal(err: &anyhow::Error) {
    error!("An error has occurred: {err:#}");
    info!("Stack: {}", Backtrace::force_capture());

    debug!("Waiting a bit for other processes to finish");
    tokio::time::sleep(FATAL_EXIT_DELAY).await;
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
