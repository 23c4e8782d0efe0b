//! Start the settle daemon

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

pub async fn run(config_dir: &Path, foreground: bool) -> Result<()> {
    if foreground {
        // Run daemon in foreground (for debugging and service managers)
        crate::daemon::start(config_dir).await
    } else {
        start_background(config_dir).await
    }
}

async fn start_background(config_dir: &Path) -> Result<()> {
    use crate::util;
    use std::process::Command;

    if crate::daemon::is_running(config_dir) {
        anyhow::bail!("Daemon already running");
    }

    let log_dir = util::log_dir(config_dir);
    std::fs::create_dir_all(&log_dir).context("Failed to create logs directory")?;
    let output_file = log_dir.join("daemon.out");

    let exe = std::env::current_exe().context("Failed to get current executable path")?;

    // Startup errors and panics land here; tracing output goes to the rolling log
    let output_writer =
        std::fs::File::create(&output_file).context("Failed to create daemon output file")?;

    Command::new("nohup")
        .arg(&exe)
        .arg("--config-dir")
        .arg(config_dir)
        .arg("start")
        .arg("--foreground")
        .stdout(output_writer.try_clone()?)
        .stderr(output_writer)
        .spawn()
        .context("Failed to spawn daemon process")?;

    // Wait for the lock to show up
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if crate::daemon::is_running(config_dir) {
            println!("Daemon started successfully");
            println!("Logs: {}", log_dir.display());
            return Ok(());
        }
    }

    anyhow::bail!(
        "Daemon failed to start (check {})",
        output_file.display()
    );
}
