//! Show monitored folders and daemon state

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use settle_core::{FolderStatus, Registry};
use std::path::Path;

use crate::daemon::{self, StatusSnapshot};
use crate::util;

#[derive(Debug, Serialize)]
struct StatusReport {
    daemon: DaemonState,
    folders: Vec<FolderStatus>,
    skipped: Vec<String>,
}

#[derive(Debug, Serialize)]
struct DaemonState {
    running: bool,
    pid: Option<u32>,
    started_at: Option<DateTime<Utc>>,
}

pub async fn run(config_dir: &Path, json: bool) -> Result<()> {
    let loaded = util::store(config_dir)
        .load()
        .context("Failed to load configuration")?;

    let running = daemon::is_running(config_dir);
    let snapshot = if running {
        daemon::read_snapshot(config_dir)
    } else {
        None
    };

    // Configured folders, with runtime state from the daemon where it has them
    let registry = Registry::new();
    for (name, spec) in loaded.folders {
        registry.add(name, spec)?;
    }
    let folders = merge(registry.list(), snapshot.as_ref());

    let report = StatusReport {
        daemon: DaemonState {
            running,
            pid: snapshot.as_ref().map(|s| s.pid),
            started_at: snapshot.as_ref().map(|s| s.started_at),
        },
        folders,
        skipped: loaded.skipped.iter().map(|e| e.to_string()).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn merge(configured: Vec<FolderStatus>, snapshot: Option<&StatusSnapshot>) -> Vec<FolderStatus> {
    let Some(snapshot) = snapshot else {
        return configured;
    };

    configured
        .into_iter()
        .map(|mut folder| {
            if let Some(live) = snapshot
                .folders
                .iter()
                .find(|s| s.name == folder.name && s.path == folder.path)
            {
                folder.last_activity = live.last_activity;
                folder.notified = live.notified;
            }
            folder
        })
        .collect()
}

fn print_report(report: &StatusReport) {
    println!("{}", "Settle Status".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    print!("Daemon:        ");
    if report.daemon.running {
        println!("{}", "Running ✓".green());
        if let Some(pid) = report.daemon.pid {
            println!("  PID:         {}", pid);
        }
        if let Some(started) = report.daemon.started_at {
            println!("  Started:     {}", util::format_relative_time(started));
        }
    } else {
        println!("{}", "Not running".yellow());
        println!("  {}", "Tip: Start with 'settle start'".dimmed());
    }
    println!();

    if report.folders.is_empty() {
        println!("No folders configured");
        println!("  {}", "Tip: Add one with 'settle add <name> <path> ntfy <topic>'".dimmed());
    }

    for folder in &report.folders {
        println!("{}", folder.name.bold());
        println!("  Path:        {}", folder.path.display().to_string().cyan());
        println!("  Notify via:  {} ({})", folder.backend, folder.destination);
        println!("  Quiet after: {}", util::format_period(folder.inactivity_period));

        let activity = match folder.last_activity {
            Some(ts) if folder.notified => {
                format!("{} (notified)", util::format_relative_time(ts))
            }
            Some(ts) => format!("{} (waiting)", util::format_relative_time(ts)),
            None => "none since daemon start".to_string(),
        };
        println!("  Activity:    {}", activity);
        println!();
    }

    for skipped in &report.skipped {
        println!("{} {}", "Skipped:".red(), skipped);
    }
}
