//! Idle detection and dispatch
//!
//! Activity is recorded per folder as events arrive; a periodic tick finds
//! folders that have been quiet for their full inactivity period and sends
//! exactly one notification per quiet transition.

use futures::future::join_all;
use settle_backends::{BackendKind, Notifier, NotifyError};
use settle_core::{ActivityStamp, PendingDispatch, Registry};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of one send attempt.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub folder: String,
    pub backend: BackendKind,
    pub error: Option<NotifyError>,
}

impl DispatchReport {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Debounce engine over a shared [`Registry`].
#[derive(Clone)]
pub struct DebounceEngine {
    registry: Arc<Registry>,
    notifier: Arc<dyn Notifier>,
}

impl DebounceEngine {
    pub fn new(registry: Arc<Registry>, notifier: Arc<dyn Notifier>) -> Self {
        Self { registry, notifier }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Record activity for `name`. Unknown names are logged and ignored,
    /// since events can race with folder removal.
    pub fn record(&self, name: &str, stamp: ActivityStamp) -> bool {
        match self.registry.get(name) {
            Ok(watch) => {
                watch.record(stamp);
                true
            }
            Err(e) => {
                debug!(error = %e, "dropping event");
                false
            }
        }
    }

    /// Mark every folder that is due at `now` and return what to send.
    /// Performs no I/O.
    pub fn collect_due(&self, now: Instant) -> Vec<PendingDispatch> {
        self.registry.collect_due(now)
    }

    /// Deliver pending notifications concurrently, one attempt each.
    ///
    /// Failures are logged and reported; the folders stay notified.
    pub async fn dispatch(&self, pending: Vec<PendingDispatch>) -> Vec<DispatchReport> {
        let sends = pending.into_iter().map(|p| {
            let notifier = self.notifier.clone();
            async move {
                let result = notifier.send(&p.backend, &p.title, &p.message).await;
                let report = DispatchReport {
                    folder: p.folder,
                    backend: p.backend.kind(),
                    error: result.err(),
                };
                match &report.error {
                    None => info!(
                        folder = %report.folder,
                        backend = %report.backend,
                        success = true,
                        "notification sent"
                    ),
                    Some(e) => warn!(
                        folder = %report.folder,
                        backend = %report.backend,
                        success = false,
                        error = %e.cause,
                        "notification failed"
                    ),
                }
                report
            }
        });

        join_all(sends).await
    }

    /// Evaluate every folder at `now` and send what is due.
    pub async fn tick(&self, now: Instant) -> Vec<DispatchReport> {
        let pending = self.collect_due(now);
        if pending.is_empty() {
            return Vec::new();
        }
        self.dispatch(pending).await
    }
}
