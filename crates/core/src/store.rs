//! On-disk JSON configuration store
//!
//! Layout of `config.json`:
//! ```text
//! {
//!   "folders": {
//!     "<name>": { "path": ..., "notification": {"type": ..., "config": {...}}, ... }
//!   },
//!   "tick_interval_secs": 5,
//!   "send_timeout_secs": 10
//! }
//! ```
//!
//! Folder entries are parsed one by one: a malformed entry is skipped and
//! reported, while an unreadable or unparsable file fails the whole load.
//! Edits (`add_folder` / `remove_folder`) operate on the raw JSON so that
//! entries this version cannot parse are preserved untouched. Each edit holds
//! an exclusive `flock` on `config.json.lock` from read to rename.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::warn;

use crate::{Error, FolderSpec, Result};

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Daemon-wide settings stored next to the folder entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How often idle folders are evaluated (default: 5s)
    pub tick_interval_secs: u64,
    /// Bound on a single notification request (default: 10s)
    pub send_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval_secs: 5,
            send_timeout_secs: 10,
        }
    }
}

impl Settings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs.max(1))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawConfig {
    #[serde(default)]
    folders: Map<String, Value>,
    #[serde(flatten)]
    settings: Settings,
}

/// Result of loading the store.
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub settings: Settings,
    /// Valid folder entries, in file order
    pub folders: Vec<(String, FolderSpec)>,
    /// Entries that were skipped, as `Error::Config`
    pub skipped: Vec<Error>,
}

impl LoadedConfig {
    pub fn get(&self, name: &str) -> Option<&FolderSpec> {
        self.folders
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }
}

/// Handle to the configuration file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<dir>/config.json`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time of the file, if it exists.
    pub fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    /// Load settings and every valid folder entry.
    ///
    /// A missing file is an empty configuration.
    pub fn load(&self) -> Result<LoadedConfig> {
        let raw = self.read_raw()?;
        let mut loaded = LoadedConfig {
            settings: raw.settings,
            ..Default::default()
        };

        for (name, value) in raw.folders {
            let parsed = serde_json::from_value::<FolderSpec>(value)
                .map_err(|e| Error::config(&name, e))
                .and_then(|spec| spec.validate(&name).map(|_| spec));

            match parsed {
                Ok(spec) => loaded.folders.push((name, spec)),
                Err(e) => {
                    warn!(folder = %name, error = %e, "Skipping invalid folder entry");
                    loaded.skipped.push(e);
                }
            }
        }

        Ok(loaded)
    }

    /// Persist a new folder entry. Fails with `DuplicateName` if the name exists,
    /// even when the existing entry is malformed.
    pub fn add_folder(&self, name: &str, spec: &FolderSpec) -> Result<()> {
        spec.validate(name)?;
        let _lock = EditLock::acquire(&self.lock_path())?;
        let mut raw = self.read_raw()?;
        if raw.folders.contains_key(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        raw.folders
            .insert(name.to_string(), serde_json::to_value(spec)?);
        self.write_raw(&raw)
    }

    /// Delete a folder entry. Fails with `NotFound` if absent.
    pub fn remove_folder(&self, name: &str) -> Result<()> {
        let _lock = EditLock::acquire(&self.lock_path())?;
        let mut raw = self.read_raw()?;
        if raw.folders.shift_remove(name).is_none() {
            return Err(Error::NotFound(name.to_string()));
        }
        self.write_raw(&raw)
    }

    /// Sidecar file that edits lock; the config file itself is replaced by rename.
    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn read_raw(&self) -> Result<RawConfig> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RawConfig::default()),
            Err(e) => return Err(Error::store(&self.path, e)),
        };
        if contents.trim().is_empty() {
            return Ok(RawConfig::default());
        }
        serde_json::from_str(&contents).map_err(|e| Error::store(&self.path, e))
    }

    /// Write via a temp file in the same directory, then rename over the target.
    fn write_raw(&self, raw: &RawConfig) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut data = serde_json::to_vec_pretty(raw)?;
        data.push(b'\n');

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Exclusive `flock` held until dropped.
struct EditLock {
    _file: File,
}

impl EditLock {
    /// Block until the lock at `path` is ours.
    fn acquire(path: &Path) -> Result<Self> {
        use nix::fcntl::{flock, FlockArg};
        use std::os::unix::io::AsRawFd;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        flock(file.as_raw_fd(), FlockArg::LockExclusive).map_err(std::io::Error::from)?;
        Ok(Self { _file: file })
    }
}
