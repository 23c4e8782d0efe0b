//! Stop the settle daemon

use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(config_dir: &Path) -> Result<()> {
    if crate::daemon::stop(config_dir).await? {
        println!("{}", "Daemon stopped".green());
    } else {
        println!("{}", "Daemon is not running".yellow());
    }
    Ok(())
}
