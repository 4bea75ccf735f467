// ── Latest-snapshot cache ──
//
// Two `watch` channels: one carries the last successful status, the other
// the outcome of the most recent refresh attempt. Failures only ever touch
// the second, so the cached status is either the newest good snapshot or
// absent.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::error::UpdateFailed;
use crate::stream::StatusStream;

/// Outcome bookkeeping for refresh attempts.
#[derive(Debug, Clone, Default)]
pub struct UpdateHealth {
    /// Completed refresh attempts, successful or not.
    pub attempts: u64,
    /// When the cached status was last replaced.
    pub last_success_at: Option<DateTime<Utc>>,
    /// Error of the most recent attempt; cleared by the next success.
    pub last_error: Option<UpdateFailed>,
}

impl UpdateHealth {
    /// `false` only while the most recent attempt failed.
    pub fn last_update_success(&self) -> bool {
        self.last_error.is_none()
    }
}

pub struct StatusStore<S: Send + Sync + 'static> {
    status: watch::Sender<Option<Arc<S>>>,
    health: watch::Sender<UpdateHealth>,
}

impl<S: Send + Sync + 'static> StatusStore<S> {
    pub fn new() -> Self {
        let (status, _) = watch::channel(None);
        let (health, _) = watch::channel(UpdateHealth::default());
        Self { status, health }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The cached status, or `None` before the first successful refresh.
    pub fn current(&self) -> Option<Arc<S>> {
        self.status.borrow().clone()
    }

    pub fn health(&self) -> UpdateHealth {
        self.health.borrow().clone()
    }

    pub fn last_update_success(&self) -> bool {
        self.health.borrow().last_update_success()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.health.borrow().last_success_at
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Subscribe to status replacements.
    pub fn subscribe(&self) -> StatusStream<S> {
        StatusStream::new(self.status.subscribe())
    }

    /// Subscribe to every refresh outcome, including failures.
    pub fn subscribe_health(&self) -> watch::Receiver<UpdateHealth> {
        self.health.subscribe()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace the cached status wholesale and notify subscribers.
    ///
    /// Returns `true` if this success ends a run of failures.
    pub(crate) fn apply_success(&self, status: Arc<S>) -> bool {
        // `send_replace` updates unconditionally, even with zero receivers.
        self.status.send_replace(Some(status));

        let mut recovered = false;
        self.health.send_modify(|h| {
            recovered = h.last_error.is_some();
            h.attempts += 1;
            h.last_success_at = Some(Utc::now());
            h.last_error = None;
        });
        recovered
    }

    /// Record a failed attempt. The cached status is left untouched.
    ///
    /// Returns `true` if the previous attempt had succeeded.
    pub(crate) fn record_failure(&self, err: UpdateFailed) -> bool {
        let mut first = false;
        self.health.send_modify(|h| {
            first = h.last_error.is_none();
            h.attempts += 1;
            h.last_error = Some(err);
        });
        first
    }

    /// Drop the cached status (teardown).
    pub(crate) fn clear(&self) {
        self.status.send_replace(None);
    }
}

impl<S: Send + Sync + 'static> Default for StatusStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn timeout() -> UpdateFailed {
        UpdateFailed::Timeout {
            device: "test".into(),
            timeout_secs: 10,
        }
    }

    #[test]
    fn empty_before_first_success() {
        let store: StatusStore<u32> = StatusStore::new();
        assert!(store.current().is_none());
        assert!(store.last_update().is_none());
        assert!(store.last_update_success());
    }

    #[test]
    fn success_replaces_status() {
        let store = StatusStore::new();
        store.apply_success(Arc::new(1_u32));
        store.apply_success(Arc::new(2_u32));
        assert_eq!(*store.current().unwrap(), 2);
        assert_eq!(store.health().attempts, 2);
        assert!(store.last_update().is_some());
    }

    #[test]
    fn failure_keeps_stale_status() {
        let store = StatusStore::new();
        store.apply_success(Arc::new(7_u32));

        assert!(store.record_failure(timeout()));
        assert!(!store.record_failure(timeout()));

        assert_eq!(*store.current().unwrap(), 7);
        assert!(!store.last_update_success());
        assert_eq!(store.health().attempts, 3);
    }

    #[test]
    fn success_after_failure_reports_recovery() {
        let store = StatusStore::new();
        store.record_failure(timeout());
        assert!(store.apply_success(Arc::new(1_u32)));
        assert!(store.last_update_success());
        assert!(!store.apply_success(Arc::new(2_u32)));
    }

    #[test]
    fn clear_drops_status() {
        let store = StatusStore::new();
        store.apply_success(Arc::new(1_u32));
        store.clear();
        assert!(store.current().is_none());
    }
}
