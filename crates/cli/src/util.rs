//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use settle_core::ConfigStore;
use std::path::{Path, PathBuf};

/// Resolve the configuration directory: explicit flag or env, else the
/// platform config dir.
pub fn config_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir),
        None => dirs::config_dir()
            .map(|d| d.join("settle"))
            .context("Could not determine a configuration directory; pass --config-dir"),
    }
}

pub fn store(config_dir: &Path) -> ConfigStore {
    ConfigStore::in_dir(config_dir)
}

pub fn lock_path(config_dir: &Path) -> PathBuf {
    config_dir.join("daemon.lock")
}

pub fn status_path(config_dir: &Path) -> PathBuf {
    config_dir.join("status.json")
}

pub fn log_dir(config_dir: &Path) -> PathBuf {
    config_dir.join("logs")
}

/// Format timestamp as relative time ("2 hours ago")
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    format_relative_to(ts, Utc::now())
}

fn format_relative_to(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - ts).num_seconds();
    if secs < 0 {
        return "just now".to_string();
    }
    let secs = secs as u64;

    if secs < 60 {
        format!("{} seconds ago", secs)
    } else if secs < 3600 {
        let mins = secs / 60;
        format!("{} minute{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if secs < 86400 {
        let hours = secs / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else {
        let days = secs / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    }
}

/// Format a duration in seconds ("5m", "1h 30m")
pub fn format_period(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        match secs % 60 {
            0 => format!("{}m", secs / 60),
            rem => format!("{}m {}s", secs / 60, rem),
        }
    } else {
        match (secs % 3600) / 60 {
            0 => format!("{}h", secs / 3600),
            mins => format!("{}h {}m", secs / 3600, mins),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_relative_time() {
        let now = Utc::now();
        assert_eq!(format_relative_to(now - Duration::seconds(5), now), "5 seconds ago");
        assert_eq!(format_relative_to(now - Duration::seconds(60), now), "1 minute ago");
        assert_eq!(format_relative_to(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(format_relative_to(now - Duration::hours(2), now), "2 hours ago");
        assert_eq!(format_relative_to(now - Duration::days(1), now), "1 day ago");
        assert_eq!(format_relative_to(now + Duration::seconds(3), now), "just now");
    }

    #[test]
    fn test_format_period() {
        assert_eq!(format_period(0), "0s");
        assert_eq!(format_period(45), "45s");
        assert_eq!(format_period(300), "5m");
        assert_eq!(format_period(90), "1m 30s");
        assert_eq!(format_period(3600), "1h");
        assert_eq!(format_period(5400), "1h 30m");
    }

    #[test]
    fn test_config_dir_explicit() {
        let dir = config_dir(Some(PathBuf::from("/tmp/settle-test"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/settle-test"));
        assert_eq!(lock_path(&dir), PathBuf::from("/tmp/settle-test/daemon.lock"));
    }
}
