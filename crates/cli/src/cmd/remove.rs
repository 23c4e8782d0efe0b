//! Stop monitoring a folder

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;

use crate::util;

pub async fn run(config_dir: &Path, name: &str) -> Result<()> {
    util::store(config_dir)
        .remove_folder(name)
        .with_context(|| format!("Failed to remove folder '{}'", name))?;

    println!("{} {}", "Removed".green(), name.bold());
    if crate::daemon::is_running(config_dir) {
        println!("  {}", "The running daemon picks this up on its next tick".dimmed());
    }
    Ok(())
}
