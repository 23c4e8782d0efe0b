//! Watched folder definitions and per-folder activity state

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use settle_backends::{Backend, BackendKind};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

use crate::{Error, Result};

/// Default quiet period before a folder counts as settled.
pub const DEFAULT_INACTIVITY_SECS: u64 = 300;

pub const DEFAULT_MESSAGE_TEMPLATE: &str = "Sync complete for {folder}";

pub const DEFAULT_TITLE: &str = "Sync Complete";

const FOLDER_PLACEHOLDER: &str = "{folder}";
const PATH_PLACEHOLDER: &str = "{path}";

/// Persisted definition of one watched folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSpec {
    /// Absolute path being observed
    pub path: PathBuf,

    /// Delivery backend and destination
    pub notification: Backend,

    /// Quiet period in seconds (default: 300)
    #[serde(default = "default_inactivity")]
    pub inactivity_period: u64,

    /// Message template; `{folder}` and `{path}` are substituted at send time
    #[serde(default = "default_template")]
    pub message_template: String,

    /// Notification title (default: "Sync Complete")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Gitignore-style patterns, relative to `path`, that never count as activity
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
}

fn default_inactivity() -> u64 {
    DEFAULT_INACTIVITY_SECS
}

fn default_template() -> String {
    DEFAULT_MESSAGE_TEMPLATE.to_string()
}

impl FolderSpec {
    pub fn new(path: impl Into<PathBuf>, notification: Backend) -> Self {
        Self {
            path: path.into(),
            notification,
            inactivity_period: DEFAULT_INACTIVITY_SECS,
            message_template: default_template(),
            title: None,
            ignore: Vec::new(),
        }
    }

    pub fn with_inactivity(mut self, secs: u64) -> Self {
        self.inactivity_period = secs;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.message_template = template.into();
        self
    }

    pub fn inactivity(&self) -> Duration {
        Duration::from_secs(self.inactivity_period)
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    /// Render the message template for the folder registered as `name`.
    pub fn render(&self, name: &str) -> String {
        render_template(&self.message_template, name, &self.path)
    }

    /// Check the entry registered as `name` for problems that would make it unusable.
    ///
    /// The path is not required to exist: a folder that disappears keeps its schedule.
    pub fn validate(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::config(name, "name must not be empty"));
        }
        if !self.path.is_absolute() {
            return Err(Error::config(
                name,
                format!("path '{}' is not absolute", self.path.display()),
            ));
        }
        self.notification
            .validate()
            .map_err(|e| Error::config(name, e))
    }
}

/// Substitute `{folder}` and `{path}` in a single pass.
///
/// Substituted text is never re-scanned, so a folder name containing
/// `{path}` is emitted verbatim.
pub fn render_template(template: &str, folder: &str, path: &Path) -> String {
    let path = path.display().to_string();
    let mut out = String::with_capacity(template.len() + folder.len());
    let mut rest = template;

    while let Some(idx) = rest.find('{') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        if let Some(after) = tail.strip_prefix(FOLDER_PLACEHOLDER) {
            out.push_str(folder);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(PATH_PLACEHOLDER) {
            out.push_str(&path);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// When an event happened: monotonic for elapsed checks, wall clock for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityStamp {
    pub at: Instant,
    pub wall: DateTime<Utc>,
}

impl ActivityStamp {
    pub fn now() -> Self {
        Self {
            at: Instant::now(),
            wall: Utc::now(),
        }
    }

    /// Stamp for a monotonic instant, deriving the wall-clock time from the current offset.
    pub fn at(at: Instant) -> Self {
        let now = Instant::now();
        let wall_now = Utc::now();
        let wall = if at <= now {
            wall_now - to_chrono(now - at)
        } else {
            wall_now + to_chrono(at - now)
        };
        Self { at, wall }
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::zero())
}

/// Transient per-folder state. Reset on restart.
#[derive(Debug, Clone, Copy, Default)]
struct ActivityState {
    last_activity: Option<ActivityStamp>,
    notified: bool,
}

impl ActivityState {
    fn record(&mut self, stamp: ActivityStamp) {
        match self.last_activity {
            Some(current) if current.at >= stamp.at => {}
            _ => self.last_activity = Some(stamp),
        }
        self.notified = false;
    }

    fn is_due(&self, now: Instant, threshold: Duration) -> bool {
        match self.last_activity {
            Some(last) if !self.notified => now.saturating_duration_since(last.at) >= threshold,
            _ => false,
        }
    }
}

/// Everything needed to deliver one notification, captured under the entry lock.
#[derive(Debug, Clone)]
pub struct PendingDispatch {
    pub folder: String,
    pub backend: Backend,
    pub title: String,
    pub message: String,
    pub last_activity: DateTime<Utc>,
}

/// Status view of one folder, as reported by `list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderStatus {
    pub name: String,
    pub path: PathBuf,
    pub backend: BackendKind,
    pub destination: String,
    pub inactivity_period: u64,
    pub last_activity: Option<DateTime<Utc>>,
    pub notified: bool,
}

/// A registered folder: immutable definition plus mutable activity state.
#[derive(Debug)]
pub struct FolderWatch {
    name: String,
    spec: FolderSpec,
    state: Mutex<ActivityState>,
}

impl FolderWatch {
    pub fn new(name: impl Into<String>, spec: FolderSpec) -> Self {
        Self {
            name: name.into(),
            spec,
            state: Mutex::new(ActivityState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &FolderSpec {
        &self.spec
    }

    /// Record activity at `stamp` and re-arm the folder for its next quiet transition.
    pub fn record(&self, stamp: ActivityStamp) {
        self.state.lock().record(stamp);
    }

    /// If the folder has been quiet for its full threshold and is not yet notified,
    /// mark it notified and return the dispatch to perform.
    ///
    /// Check and mark happen under one lock, so a concurrent `record` either lands
    /// before the check or re-arms the folder for the next tick.
    pub fn take_due(&self, now: Instant) -> Option<PendingDispatch> {
        let mut state = self.state.lock();
        if !state.is_due(now, self.spec.inactivity()) {
            return None;
        }
        state.notified = true;
        let last_activity = state.last_activity.map(|s| s.wall).unwrap_or_else(Utc::now);
        drop(state);

        Some(PendingDispatch {
            folder: self.name.clone(),
            backend: self.spec.notification.clone(),
            title: self.spec.title().to_string(),
            message: self.spec.render(&self.name),
            last_activity,
        })
    }

    pub fn last_activity(&self) -> Option<ActivityStamp> {
        self.state.lock().last_activity
    }

    pub fn is_notified(&self) -> bool {
        self.state.lock().notified
    }

    pub fn status(&self) -> FolderStatus {
        let state = *self.state.lock();
        FolderStatus {
            name: self.name.clone(),
            path: self.spec.path.clone(),
            backend: self.spec.notification.kind(),
            destination: self.spec.notification.destination(),
            inactivity_period: self.spec.inactivity_period,
            last_activity: state.last_activity.map(|s| s.wall),
            notified: state.notified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settle_backends::NtfyConfig;

    fn spec(secs: u64) -> FolderSpec {
        FolderSpec::new("/srv/docs", Backend::Ntfy(NtfyConfig::new("t"))).with_inactivity(secs)
    }

    #[test]
    fn test_render_template() {
        let path = Path::new("/srv/docs");
        assert_eq!(
            render_template("Sync complete for {folder}", "docs", path),
            "Sync complete for docs"
        );
        assert_eq!(
            render_template("{folder} at {path}: {folder}", "docs", path),
            "docs at /srv/docs: docs"
        );
        assert_eq!(render_template("no placeholders", "docs", path), "no placeholders");
        assert_eq!(render_template("{unknown} {", "docs", path), "{unknown} {");
    }

    #[test]
    fn test_render_does_not_rescan_substitutions() {
        let rendered = render_template("{folder}", "{path}", Path::new("/x"));
        assert_eq!(rendered, "{path}");
    }

    #[test]
    fn test_spec_defaults_on_deserialize() {
        let spec: FolderSpec = serde_json::from_str(
            r#"{"path": "/srv/docs", "notification": {"type": "ntfy", "config": {"topic": "t"}}}"#,
        )
        .unwrap();
        assert_eq!(spec.inactivity_period, DEFAULT_INACTIVITY_SECS);
        assert_eq!(spec.message_template, DEFAULT_MESSAGE_TEMPLATE);
        assert_eq!(spec.title(), DEFAULT_TITLE);
        assert!(spec.ignore.is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(spec(5).validate("docs").is_ok());
        assert!(matches!(spec(5).validate(" "), Err(Error::Config { .. })));

        let relative = FolderSpec::new("docs", Backend::Ntfy(NtfyConfig::new("t")));
        assert!(matches!(relative.validate("docs"), Err(Error::Config { .. })));

        let no_topic = FolderSpec::new("/srv/docs", Backend::Ntfy(NtfyConfig::new("")));
        assert!(matches!(no_topic.validate("docs"), Err(Error::Config { .. })));
    }

    #[test]
    fn test_not_due_without_activity() {
        let watch = FolderWatch::new("docs", spec(0));
        assert!(watch.take_due(Instant::now()).is_none());
        assert!(watch.last_activity().is_none());
    }

    #[test]
    fn test_record_keeps_latest_stamp() {
        let watch = FolderWatch::new("docs", spec(5));
        let base = Instant::now();
        watch.record(ActivityStamp::at(base + Duration::from_secs(10)));
        watch.record(ActivityStamp::at(base + Duration::from_secs(4)));

        assert_eq!(
            watch.last_activity().map(|s| s.at),
            Some(base + Duration::from_secs(10))
        );
    }

    #[test]
    fn test_take_due_marks_notified_once() {
        let watch = FolderWatch::new("docs", spec(5));
        let base = Instant::now();
        watch.record(ActivityStamp::at(base));

        assert!(watch.take_due(base + Duration::from_secs(4)).is_none());
        let pending = watch.take_due(base + Duration::from_secs(5)).unwrap();
        assert_eq!(pending.folder, "docs");
        assert_eq!(pending.message, "Sync complete for docs");
        assert_eq!(pending.title, DEFAULT_TITLE);
        assert!(watch.is_notified());
        assert!(watch.take_due(base + Duration::from_secs(60)).is_none());
    }

    #[test]
    fn test_zero_threshold_is_immediate() {
        let watch = FolderWatch::new("docs", spec(0));
        let base = Instant::now();
        watch.record(ActivityStamp::at(base));
        assert!(watch.take_due(base).is_some());
    }

    #[test]
    fn test_record_after_notify_rearms() {
        let watch = FolderWatch::new("docs", spec(1));
        let base = Instant::now();
        watch.record(ActivityStamp::at(base));
        assert!(watch.take_due(base + Duration::from_secs(1)).is_some());

        watch.record(ActivityStamp::at(base + Duration::from_secs(2)));
        assert!(!watch.is_notified());
        assert!(watch.take_due(base + Duration::from_secs(2)).is_none());
        assert!(watch.take_due(base + Duration::from_secs(3)).is_some());
    }

    #[test]
    fn test_status_reflects_state() {
        let watch = FolderWatch::new("docs", spec(0));
        let status = watch.status();
        assert_eq!(status.name, "docs");
        assert_eq!(status.backend, BackendKind::Ntfy);
        assert!(status.last_activity.is_none());
        assert!(!status.notified);

        watch.record(ActivityStamp::now());
        watch.take_due(Instant::now());
        let status = watch.status();
        assert!(status.last_activity.is_some());
        assert!(status.notified);
    }
}
