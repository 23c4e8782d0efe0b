//! Tracing setup for the CLI and the daemon

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_CLI_FILTER: &str = "warn";
const DEFAULT_DAEMON_FILTER: &str = "info";

/// Log file name inside the logs directory; rotated daily.
pub const LOG_FILE_NAME: &str = "settle.log";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Short-lived commands log to stderr only.
pub fn init_cli() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(DEFAULT_CLI_FILTER))
        .with_writer(std::io::stderr)
        .try_init();
}

/// The daemon logs to stderr and to a daily-rolled file in `log_dir`.
///
/// Keep the returned guard alive for the daemon's lifetime.
pub fn init_daemon(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_DAEMON_FILTER))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
