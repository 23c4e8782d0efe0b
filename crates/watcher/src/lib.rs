//! File system watching and idle detection for settle
//!
//! This crate provides:
//! - One recursive OS watcher per registered folder
//! - Filtering of events that should not count as activity
//! - The debounce engine that turns quiet periods into notifications

pub mod debounce;
pub mod ignore;

pub use debounce::{DebounceEngine, DispatchReport};
pub use self::ignore::IgnoreRules;

use anyhow::{Context, Result};
use dashmap::DashMap;
use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RemoveKind};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use settle_core::{ActivityStamp, FolderSpec};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// File system event attributed to a registered folder
#[derive(Debug, Clone)]
pub struct WatchEvent {
    /// Folder the event belongs to
    pub folder: String,
    /// Path that changed
    pub path: PathBuf,
    /// Type of change
    pub kind: EventKind,
    /// When the event was observed
    pub stamp: ActivityStamp,
}

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// File created
    Create,
    /// File modified
    Modify,
    /// File deleted
    Delete,
    /// File renamed
    Rename,
}

impl EventKind {
    /// Map a raw notify event kind. `None` means the event is not activity.
    pub fn classify(kind: &notify::EventKind) -> Option<Self> {
        use notify::EventKind as Raw;

        match kind {
            Raw::Create(CreateKind::Folder) => None,
            Raw::Create(_) => Some(Self::Create),
            Raw::Modify(ModifyKind::Name(_)) => Some(Self::Rename),
            Raw::Modify(_) => Some(Self::Modify),
            Raw::Remove(RemoveKind::Folder) => None,
            Raw::Remove(_) => Some(Self::Delete),
            Raw::Access(AccessKind::Close(AccessMode::Write)) => Some(Self::Modify),
            Raw::Access(_) => None,
            Raw::Any => Some(Self::Modify),
            Raw::Other => None,
        }
    }
}

/// Owns the OS watchers for every registered folder.
///
/// Events from all folders are delivered on the single channel returned by
/// [`FolderWatcher::new`].
pub struct FolderWatcher {
    tx: mpsc::UnboundedSender<WatchEvent>,
    watchers: DashMap<String, RecommendedWatcher>,
}

impl FolderWatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WatchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            tx,
            watchers: DashMap::new(),
        };
        (watcher, rx)
    }

    /// Start watching `spec.path` recursively on behalf of `name`.
    ///
    /// Watching a name that is already watched replaces the old watcher.
    pub fn watch(&self, name: &str, spec: &FolderSpec) -> Result<()> {
        let rules = IgnoreRules::new(&spec.path, &spec.ignore)
            .with_context(|| format!("bad ignore patterns for folder '{}'", name))?;
        let patterns = rules.pattern_count();
        let tx = self.tx.clone();
        let folder = name.to_string();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!(folder = %folder, error = %e, "file watcher error");
                    return;
                }
            };

            let Some(kind) = EventKind::classify(&event.kind) else {
                return;
            };

            for path in event.paths {
                if path.is_dir() || rules.should_ignore(&path, false) {
                    continue;
                }
                debug!(folder = %folder, path = %path.display(), ?kind, "file activity");
                let watch_event = WatchEvent {
                    folder: folder.clone(),
                    path,
                    kind,
                    stamp: ActivityStamp::now(),
                };
                if tx.send(watch_event).is_err() {
                    return; // receiver dropped
                }
            }
        })
        .context("failed to create file watcher")?;

        watcher
            .watch(&spec.path, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", spec.path.display()))?;

        info!(folder = %name, path = %spec.path.display(), patterns, "watching folder");
        self.watchers.insert(name.to_string(), watcher);
        Ok(())
    }

    /// Stop watching `name`. Returns false if it was not watched.
    pub fn unwatch(&self, name: &str) -> bool {
        let removed = self.watchers.remove(name).is_some();
        if removed {
            info!(folder = %name, "stopped watching folder");
        }
        removed
    }

    pub fn is_watching(&self, name: &str) -> bool {
        self.watchers.contains_key(name)
    }

    /// Drop every OS watcher.
    pub fn unwatch_all(&self) {
        self.watchers.clear();
    }
}
