//! Process-wide catalog of watched folders

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::time::Instant;

use crate::{Error, FolderSpec, FolderStatus, FolderWatch, PendingDispatch, Result};

/// Watched folders keyed by unique name, in insertion order.
///
/// Insert and remove take the write lock; idle scans hold the read lock for
/// their whole pass, so a scan sees each entry either fully present or absent.
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<Vec<Arc<FolderWatch>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new folder. Fails with `DuplicateName` if `name` is taken.
    pub fn add(&self, name: impl Into<String>, spec: FolderSpec) -> Result<Arc<FolderWatch>> {
        let name = name.into();
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.name() == name) {
            return Err(Error::DuplicateName(name));
        }
        let watch = Arc::new(FolderWatch::new(name, spec));
        entries.push(watch.clone());
        Ok(watch)
    }

    /// Unregister a folder. Fails with `NotFound` if absent.
    pub fn remove(&self, name: &str) -> Result<Arc<FolderWatch>> {
        let mut entries = self.entries.write();
        let idx = entries
            .iter()
            .position(|e| e.name() == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        Ok(entries.remove(idx))
    }

    /// Swap in a new definition for an existing folder, keeping its position.
    /// Activity state starts fresh.
    pub fn replace(&self, name: &str, spec: FolderSpec) -> Result<Arc<FolderWatch>> {
        let mut entries = self.entries.write();
        let slot = entries
            .iter_mut()
            .find(|e| e.name() == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        let watch = Arc::new(FolderWatch::new(name, spec));
        *slot = watch.clone();
        Ok(watch)
    }

    pub fn get(&self, name: &str) -> Result<Arc<FolderWatch>> {
        self.entries
            .read()
            .iter()
            .find(|e| e.name() == name)
            .cloned()
            .ok_or_else(|| Error::UnknownFolder(name.to_string()))
    }

    /// Snapshot of every folder's status, in insertion order.
    pub fn list(&self) -> Vec<FolderStatus> {
        self.entries.read().iter().map(|e| e.status()).collect()
    }

    /// Snapshot of the registered entries, in insertion order.
    pub fn entries(&self) -> Vec<Arc<FolderWatch>> {
        self.entries.read().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .map(|e| e.name().to_string())
            .collect()
    }

    /// Mark every folder that crossed its threshold at `now` and return what to send.
    ///
    /// No I/O happens here; callers deliver the returned dispatches after the
    /// locks are released.
    pub fn collect_due(&self, now: Instant) -> Vec<PendingDispatch> {
        self.entries
            .read()
            .iter()
            .filter_map(|e| e.take_due(now))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
