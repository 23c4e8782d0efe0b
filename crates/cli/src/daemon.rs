//! Daemon main loop
//!
//! One task owns the watcher, the engine and the config store. Each pass of
//! the loop handles one of:
//! - a file event, recorded against its folder
//! - a tick: reload config if it changed, collect due folders, spawn their
//!   sends, refresh the status snapshot
//! - a finished send task
//! - SIGINT / SIGTERM

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use settle_backends::HttpNotifier;
use settle_core::{ConfigStore, FolderSpec, FolderStatus, LoadedConfig, Registry};
use settle_watcher::{DebounceEngine, DispatchReport, FolderWatcher};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::locks::{self, DaemonLock};
use crate::{logging, util};

/// How long in-flight sends may run after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Runtime view of the daemon, written to `status.json` on every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub folders: Vec<FolderStatus>,
}

/// Run the daemon in the foreground until SIGINT or SIGTERM.
pub async fn start(config_dir: &Path) -> Result<()> {
    let _guard = logging::init_daemon(&util::log_dir(config_dir))?;
    let lock = DaemonLock::acquire(&util::lock_path(config_dir))?;

    let mut store = StoreWatch::new(util::store(config_dir));
    let loaded = store
        .load()
        .with_context(|| format!("Failed to load {}", store.path().display()))?;
    let settings = loaded.settings.clone();

    let registry = Arc::new(Registry::new());
    let notifier = Arc::new(
        HttpNotifier::with_timeout(settings.send_timeout()).context("Failed to build HTTP client")?,
    );
    let engine = DebounceEngine::new(registry.clone(), notifier);
    let (watcher, mut events) = FolderWatcher::new();

    for (name, spec) in loaded.folders {
        register(&registry, &watcher, name, spec);
    }

    let started_at = Utc::now();
    let status_path = util::status_path(config_dir);

    let mut sigterm = signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to register SIGINT handler")?;

    let mut ticker = tokio::time::interval(settings.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sends: JoinSet<Vec<DispatchReport>> = JoinSet::new();

    info!(
        pid = std::process::id(),
        folders = registry.len(),
        tick_secs = settings.tick_interval_secs,
        "daemon started"
    );

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                engine.record(&event.folder, event.stamp);
            }
            _ = ticker.tick() => {
                if store.changed() {
                    reload(&store, &registry, &watcher);
                }

                let pending = engine.collect_due(Instant::now());
                if !pending.is_empty() {
                    let engine = engine.clone();
                    sends.spawn(async move { engine.dispatch(pending).await });
                }

                let snapshot = StatusSnapshot {
                    pid: std::process::id(),
                    started_at,
                    updated_at: Utc::now(),
                    folders: registry.list(),
                };
                if let Err(e) = write_snapshot(&status_path, &snapshot) {
                    warn!(error = %e, "failed to write status snapshot");
                }
            }
            Some(joined) = sends.join_next() => {
                if let Err(e) = joined {
                    error!(error = %e, "send task failed");
                }
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
                break;
            }
        }
    }

    watcher.unwatch_all();

    if !sends.is_empty() {
        info!(in_flight = sends.len(), "waiting for in-flight notifications");
        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while sends.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("abandoning in-flight notifications");
            sends.abort_all();
        }
    }

    let _ = std::fs::remove_file(&status_path);
    lock.release()?;
    info!("daemon stopped");
    Ok(())
}

/// Stop a running daemon with SIGTERM and wait for it to release its lock.
pub async fn stop(config_dir: &Path) -> Result<bool> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let lock_path = util::lock_path(config_dir);
    let Some(running) = locks::read_running(&lock_path) else {
        return Ok(false);
    };

    let pid = i32::try_from(running.pid).context("Invalid pid in lock file")?;
    kill(Pid::from_raw(pid), Signal::SIGTERM).context("Failed to signal daemon")?;

    let deadline = Instant::now() + SHUTDOWN_GRACE + Duration::from_secs(5);
    while Instant::now() < deadline {
        if !locks::is_process_alive(running.pid) || locks::read_running(&lock_path).is_none() {
            return Ok(true);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    anyhow::bail!("Daemon (pid {}) did not stop in time", running.pid)
}

pub fn is_running(config_dir: &Path) -> bool {
    locks::read_running(&util::lock_path(config_dir)).is_some()
}

/// Last snapshot written by a running daemon, if any.
pub fn read_snapshot(config_dir: &Path) -> Option<StatusSnapshot> {
    let contents = std::fs::read_to_string(util::status_path(config_dir)).ok()?;
    serde_json::from_str(&contents).ok()
}

fn write_snapshot(path: &Path, snapshot: &StatusSnapshot) -> Result<()> {
    let dir = path.parent().context("Status path has no parent")?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, snapshot)?;
    tmp.write_all(b"\n")?;
    tmp.persist(path)?;
    Ok(())
}

/// Config store plus the modification time it was last read at.
struct StoreWatch {
    store: ConfigStore,
    last_modified: Option<SystemTime>,
}

impl StoreWatch {
    fn new(store: ConfigStore) -> Self {
        Self {
            store,
            last_modified: None,
        }
    }

    /// Load the store. The mtime is taken before reading, so an edit that
    /// lands during the read is seen by the next `changed`.
    fn load(&mut self) -> settle_core::Result<LoadedConfig> {
        self.last_modified = self.store.modified();
        self.store.load()
    }

    /// True once per modification since the last `load` or `changed`.
    fn changed(&mut self) -> bool {
        let modified = self.store.modified();
        if modified == self.last_modified {
            return false;
        }
        self.last_modified = modified;
        true
    }
}

impl std::ops::Deref for StoreWatch {
    type Target = ConfigStore;

    fn deref(&self) -> &ConfigStore {
        &self.store
    }
}

/// Add a folder to the registry and start watching it.
///
/// A folder whose path cannot be watched stays registered: it keeps any
/// activity already recorded and is reported by status.
fn register(registry: &Registry, watcher: &FolderWatcher, name: String, spec: FolderSpec) {
    if let Err(e) = watcher.watch(&name, &spec) {
        warn!(folder = %name, error = %format!("{:#}", e), "folder is not being watched");
    }
    if let Err(e) = registry.add(name, spec) {
        warn!(error = %e, "failed to register folder");
    }
}

/// Difference between the running folder set and the stored one.
#[derive(Debug, Default)]
pub struct ReloadPlan {
    pub added: Vec<(String, FolderSpec)>,
    pub removed: Vec<String>,
    pub changed: Vec<(String, FolderSpec)>,
}

impl ReloadPlan {
    pub fn compute(current: &[(String, FolderSpec)], stored: Vec<(String, FolderSpec)>) -> Self {
        let running: HashMap<&str, &FolderSpec> =
            current.iter().map(|(n, s)| (n.as_str(), s)).collect();
        let mut plan = Self::default();

        plan.removed = current
            .iter()
            .filter(|(name, _)| !stored.iter().any(|(n, _)| n == name))
            .map(|(name, _)| name.clone())
            .collect();

        for (name, spec) in stored {
            match running.get(name.as_str()) {
                None => plan.added.push((name, spec)),
                Some(existing) if **existing != spec => plan.changed.push((name, spec)),
                Some(_) => {}
            }
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Re-read the store and bring the registry and watchers in line with it.
///
/// An unreadable store leaves the running set untouched.
fn reload(store: &ConfigStore, registry: &Registry, watcher: &FolderWatcher) {
    let loaded = match store.load() {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!(error = %e, "config reload failed, keeping current folders");
            return;
        }
    };

    let current: Vec<(String, FolderSpec)> = registry
        .entries()
        .iter()
        .map(|w| (w.name().to_string(), w.spec().clone()))
        .collect();
    let plan = ReloadPlan::compute(&current, loaded.folders);
    if plan.is_empty() {
        return;
    }

    for name in &plan.removed {
        watcher.unwatch(name);
        if let Err(e) = registry.remove(name) {
            warn!(error = %e, "failed to remove folder");
        }
    }

    for (name, spec) in plan.changed {
        watcher.unwatch(&name);
        if let Err(e) = watcher.watch(&name, &spec) {
            warn!(folder = %name, error = %format!("{:#}", e), "folder is not being watched");
        }
        if let Err(e) = registry.replace(&name, spec) {
            warn!(error = %e, "failed to update folder");
        }
    }

    for (name, spec) in plan.added {
        register(registry, watcher, name, spec);
    }

    info!(folders = registry.len(), "configuration reloaded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use settle_backends::{Backend, NtfyConfig};

    fn spec(path: &str, secs: u64) -> FolderSpec {
        FolderSpec::new(path, Backend::Ntfy(NtfyConfig::new("t"))).with_inactivity(secs)
    }

    #[test]
    fn test_reload_plan() {
        let current = vec![
            ("keep".to_string(), spec("/k", 5)),
            ("gone".to_string(), spec("/g", 5)),
            ("edit".to_string(), spec("/e", 5)),
        ];
        let stored = vec![
            ("keep".to_string(), spec("/k", 5)),
            ("edit".to_string(), spec("/e", 60)),
            ("new".to_string(), spec("/n", 5)),
        ];

        let plan = ReloadPlan::compute(&current, stored);
        assert_eq!(plan.removed, ["gone"]);
        assert_eq!(plan.changed.len(), 1);
        assert_eq!(plan.changed[0].0, "edit");
        assert_eq!(plan.changed[0].1.inactivity_period, 60);
        assert_eq!(plan.added.len(), 1);
        assert_eq!(plan.added[0].0, "new");
    }

    #[test]
    fn test_reload_plan_unchanged() {
        let current = vec![("a".to_string(), spec("/a", 5))];
        let plan = ReloadPlan::compute(&current, current.clone());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = Registry::new();
        registry.add("docs", spec("/d", 5)).unwrap();

        let snapshot = StatusSnapshot {
            pid: 42,
            started_at: Utc::now(),
            updated_at: Utc::now(),
            folders: registry.list(),
        };
        write_snapshot(&util::status_path(dir.path()), &snapshot).unwrap();

        let read = read_snapshot(dir.path()).unwrap();
        assert_eq!(read.pid, 42);
        assert_eq!(read.folders, snapshot.folders);
    }

    #[test]
    fn test_store_watch_sees_edits_after_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = StoreWatch::new(ConfigStore::in_dir(dir.path()));

        assert!(store.load().unwrap().folders.is_empty());
        assert!(!store.changed());

        store.add_folder("a", &spec("/a", 5)).unwrap();
        assert!(store.changed());
        assert!(!store.changed());

        store.add_folder("b", &spec("/b", 5)).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.folders.len(), 2);
        assert!(!store.changed());
    }

    #[test]
    fn test_reload_applies_store_changes() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = ConfigStore::in_dir(dir.path());
        let registry = Registry::new();
        let (watcher, _rx) = FolderWatcher::new();

        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();

        store.add_folder("a", &spec(a.to_str().unwrap(), 5)).unwrap();
        reload(&store, &registry, &watcher);
        assert_eq!(registry.names(), ["a"]);
        assert!(watcher.is_watching("a"));

        store.remove_folder("a").unwrap();
        store.add_folder("b", &spec(b.to_str().unwrap(), 5)).unwrap();
        reload(&store, &registry, &watcher);
        assert_eq!(registry.names(), ["b"]);
        assert!(!watcher.is_watching("a"));
        assert!(watcher.is_watching("b"));
    }
}
