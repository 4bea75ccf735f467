// ── Status streams ──
//
// Subscription type for consuming status replacements from the store.

use std::sync::Arc;

use tokio::sync::watch;

/// A subscription to a coordinator's cached status.
///
/// Provides point-in-time access and change notification via
/// [`changed()`](Self::changed).
pub struct StatusStream<S: Send + Sync + 'static> {
    current: Option<Arc<S>>,
    receiver: watch::Receiver<Option<Arc<S>>>,
}

impl<S: Send + Sync + 'static> StatusStream<S> {
    pub(crate) fn new(receiver: watch::Receiver<Option<Arc<S>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The status captured at creation time (or at the last `changed()`).
    pub fn current(&self) -> Option<&Arc<S>> {
        self.current.as_ref()
    }

    /// Wait for the next successful refresh, returning the new status.
    /// Returns `None` once the coordinator has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<S>> {
        loop {
            self.receiver.changed().await.ok()?;
            let snap = self.receiver.borrow_and_update().clone();
            // Teardown clears the cache; that is not an update.
            if let Some(status) = snap {
                self.current = Some(Arc::clone(&status));
                return Some(status);
            }
        }
    }
}
