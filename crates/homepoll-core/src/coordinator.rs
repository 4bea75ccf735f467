// ── Polling coordinator ──
//
// Owns one vendor client and the status cache fed by it. Refreshes run on
// a fixed interval in a background task and on demand; at most one fetch
// is in flight per coordinator, and callers that arrive while it runs
// share its outcome.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::CoordinatorConfig;
use crate::device::DeviceClient;
use crate::error::{CoreError, UpdateFailed};
use crate::store::{StatusStore, UpdateHealth};
use crate::stream::StatusStream;

type RefreshOutcome<S> = Result<Arc<S>, UpdateFailed>;

/// Polls one device and caches its latest status.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`; every clone shares the
/// same client, cache, and refresh lock.
pub struct Coordinator<C: DeviceClient> {
    inner: Arc<CoordinatorInner<C>>,
}

struct CoordinatorInner<C: DeviceClient> {
    config: CoordinatorConfig,
    client: Arc<C>,
    store: StatusStore<C::Status>,
    /// Held for the duration of a fetch; stores that fetch's outcome.
    refresh_slot: Mutex<Option<RefreshOutcome<C::Status>>>,
    /// Bumped after every completed fetch, before the slot is released.
    generation: AtomicU64,
    cancel: CancellationToken,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl<C: DeviceClient> Clone for Coordinator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: DeviceClient> Coordinator<C> {
    /// Create a coordinator around `client`. Does NOT fetch -- call
    /// [`first_refresh()`](Self::first_refresh) and [`start()`](Self::start).
    pub fn new(client: C, config: CoordinatorConfig) -> Self {
        Self::with_shared_client(Arc::new(client), config)
    }

    pub fn with_shared_client(client: Arc<C>, config: CoordinatorConfig) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                client,
                store: StatusStore::new(),
                refresh_slot: Mutex::new(None),
                generation: AtomicU64::new(0),
                cancel: CancellationToken::new(),
                task_handle: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// The shared vendor client handle.
    pub fn client(&self) -> &Arc<C> {
        &self.inner.client
    }

    pub fn store(&self) -> &StatusStore<C::Status> {
        &self.inner.store
    }

    // ── Reads (never block) ──────────────────────────────────────

    /// The cached status, or `None` before the first successful refresh.
    pub fn data(&self) -> Option<Arc<C::Status>> {
        self.inner.store.current()
    }

    pub fn last_update_success(&self) -> bool {
        self.inner.store.last_update_success()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_update()
    }

    pub fn subscribe(&self) -> StatusStream<C::Status> {
        self.inner.store.subscribe()
    }

    pub fn health(&self) -> watch::Receiver<UpdateHealth> {
        self.inner.store.subscribe_health()
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Fetch a new status now.
    ///
    /// If another refresh is already running, waits for it and returns
    /// its outcome instead of issuing a second upstream call. Fails with
    /// [`UpdateFailed::Shutdown`] once [`shutdown()`](Self::shutdown) has
    /// been called, leaving the cleared cache empty.
    pub async fn refresh(&self) -> Result<Arc<C::Status>, UpdateFailed> {
        self.ensure_running()?;
        let observed = self.inner.generation.load(Ordering::Acquire);
        let mut slot = self.inner.refresh_slot.lock().await;
        self.ensure_running()?;

        if self.inner.generation.load(Ordering::Acquire) != observed {
            if let Some(outcome) = slot.as_ref() {
                debug!(coordinator = %self.name(), "joined in-flight refresh");
                return outcome.clone();
            }
        }

        let outcome = self.fetch_once().await;
        // A fetch that straddles shutdown must not refill the cache.
        self.ensure_running()?;
        self.record(&outcome);

        *slot = Some(outcome.clone());
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    /// Initial refresh during setup.
    ///
    /// Unlike scheduled refreshes, a failure here is reported as
    /// [`CoreError::NotReady`]: there is no stale status to fall back on.
    pub async fn first_refresh(&self) -> Result<Arc<C::Status>, CoreError> {
        self.refresh().await.map_err(|source| match source {
            UpdateFailed::Shutdown { device } => CoreError::Shutdown { name: device },
            source => CoreError::NotReady {
                name: self.name().to_owned(),
                source,
            },
        })
    }

    fn ensure_running(&self) -> Result<(), UpdateFailed> {
        if self.is_shut_down() {
            return Err(UpdateFailed::Shutdown {
                device: self.name().to_owned(),
            });
        }
        Ok(())
    }

    async fn fetch_once(&self) -> RefreshOutcome<C::Status> {
        let config = &self.inner.config;
        let fetch = self.inner.client.fetch_status();

        match tokio::time::timeout(config.request_timeout, fetch).await {
            Ok(Ok(status)) => Ok(Arc::new(status)),
            Ok(Err(source)) => Err(UpdateFailed::Fetch {
                device: config.name.clone(),
                source: Arc::new(source),
            }),
            Err(_elapsed) => Err(UpdateFailed::Timeout {
                device: config.name.clone(),
                timeout_secs: config.request_timeout.as_secs(),
            }),
        }
    }

    /// Push the outcome into the store and log state transitions once.
    fn record(&self, outcome: &RefreshOutcome<C::Status>) {
        let name = self.name();
        match outcome {
            Ok(status) => {
                if self.inner.store.apply_success(Arc::clone(status)) {
                    info!(coordinator = %name, "fetching {name} data recovered");
                } else {
                    debug!(coordinator = %name, "refresh complete");
                }
            }
            Err(e) => {
                if self.inner.store.record_failure(e.clone()) {
                    error!(coordinator = %name, error = %e, "{name} query did not complete");
                } else {
                    debug!(coordinator = %name, error = %e, "refresh still failing");
                }
            }
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the scheduled refresh task.
    ///
    /// No-op when the update interval is zero or the task is already
    /// running. Fails once the coordinator has been shut down.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.is_shut_down() {
            return Err(CoreError::Shutdown {
                name: self.name().to_owned(),
            });
        }

        let interval = self.inner.config.update_interval;
        if interval.is_zero() {
            debug!(coordinator = %self.name(), "scheduled refresh disabled");
            return Ok(());
        }

        let mut handle = self.inner.task_handle.lock().await;
        if handle.is_none() {
            let cancel = self.inner.cancel.clone();
            *handle = Some(tokio::spawn(refresh_task(self.clone(), interval, cancel)));
            debug!(coordinator = %self.name(), ?interval, "scheduled refresh started");
        }
        Ok(())
    }

    /// Stop scheduled refreshes and drop the cached status.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        if let Some(handle) = self.inner.task_handle.lock().await.take() {
            let _ = handle.await;
        }

        self.inner.store.clear();
        debug!(coordinator = %self.name(), "shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}

// ── Background task ──────────────────────────────────────────────

/// Periodically refresh the coordinator until cancelled.
async fn refresh_task<C: DeviceClient>(
    coordinator: Coordinator<C>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                // Failures are logged by `record`; the next tick retries.
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = coordinator.refresh() => {}
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    /// Scripted client: each call pops the next step, repeating the last.
    struct FakeClient {
        calls: AtomicUsize,
        delay: Duration,
        fail_on: std::sync::Mutex<Vec<usize>>,
    }

    impl FakeClient {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                fail_on: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn failing_on(self, calls: &[usize]) -> Self {
            *self.fail_on.lock().unwrap() = calls.to_vec();
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DeviceClient for FakeClient {
        type Status = usize;

        async fn fetch_status(&self) -> Result<usize, homepoll_api::Error> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            if self.fail_on.lock().unwrap().contains(&n) {
                return Err(homepoll_api::Error::Vendor {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            Ok(n)
        }
    }

    fn config(interval: Duration) -> CoordinatorConfig {
        CoordinatorConfig {
            name: "fake".into(),
            update_interval: interval,
            request_timeout: Duration::from_secs(10),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_data_before_first_refresh() {
        let coordinator = Coordinator::new(FakeClient::new(Duration::ZERO), config(Duration::ZERO));
        assert!(coordinator.data().is_none());
        assert_eq!(coordinator.client().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_caches_status() {
        let coordinator = Coordinator::new(FakeClient::new(Duration::ZERO), config(Duration::ZERO));

        let status = coordinator.refresh().await.unwrap();
        assert_eq!(*status, 1);
        assert_eq!(*coordinator.data().unwrap(), 1);
        assert!(coordinator.last_update_success());
        assert!(coordinator.last_update().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_previous_status() {
        let client = FakeClient::new(Duration::ZERO).failing_on(&[2]);
        let coordinator = Coordinator::new(client, config(Duration::ZERO));

        coordinator.refresh().await.unwrap();
        let err = coordinator.refresh().await.unwrap_err();

        assert!(matches!(err, UpdateFailed::Fetch { .. }));
        assert_eq!(*coordinator.data().unwrap(), 1);
        assert!(!coordinator.last_update_success());

        // Recovery clears the failure.
        assert_eq!(*coordinator.refresh().await.unwrap(), 3);
        assert!(coordinator.last_update_success());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out_without_touching_cache() {
        let client = FakeClient::new(Duration::from_secs(30));
        let coordinator = Coordinator::new(client, config(Duration::ZERO));

        let err = coordinator.refresh().await.unwrap_err();

        assert!(err.is_timeout());
        assert!(matches!(err, UpdateFailed::Timeout { timeout_secs: 10, .. }));
        assert!(coordinator.data().is_none());
        assert!(!coordinator.last_update_success());
    }

    #[tokio::test(start_paused = true)]
    async fn first_refresh_failure_is_not_ready() {
        let client = FakeClient::new(Duration::ZERO).failing_on(&[1]);
        let coordinator = Coordinator::new(client, config(Duration::ZERO));

        let err = coordinator.first_refresh().await.unwrap_err();
        assert!(matches!(err, CoreError::NotReady { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_refreshes_share_one_fetch() {
        let client = FakeClient::new(Duration::from_secs(1));
        let coordinator = Coordinator::new(client, config(Duration::ZERO));

        let (a, b, c) = tokio::join!(
            coordinator.refresh(),
            coordinator.refresh(),
            coordinator.refresh()
        );

        assert_eq!(coordinator.client().calls(), 1);
        assert_eq!(*a.unwrap(), 1);
        assert_eq!(*b.unwrap(), 1);
        assert_eq!(*c.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_refreshes_share_one_failure() {
        let client = FakeClient::new(Duration::from_secs(1)).failing_on(&[1]);
        let coordinator = Coordinator::new(client, config(Duration::ZERO));

        let (a, b) = tokio::join!(coordinator.refresh(), coordinator.refresh());

        assert_eq!(coordinator.client().calls(), 1);
        assert!(a.is_err());
        assert!(b.is_err());
        assert_eq!(coordinator.store().health().attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_refreshes_each_fetch() {
        let coordinator = Coordinator::new(FakeClient::new(Duration::ZERO), config(Duration::ZERO));

        coordinator.refresh().await.unwrap();
        coordinator.refresh().await.unwrap();

        assert_eq!(coordinator.client().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_refresh_runs_on_interval() {
        let coordinator =
            Coordinator::new(FakeClient::new(Duration::ZERO), config(Duration::from_secs(60)));

        coordinator.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(125)).await;

        assert_eq!(coordinator.client().calls(), 2);
        assert_eq!(*coordinator.data().unwrap(), 2);

        coordinator.shutdown().await;
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(coordinator.client().calls(), 2);
        assert!(coordinator.data().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_refresh_survives_failures() {
        let client = FakeClient::new(Duration::ZERO).failing_on(&[1]);
        let coordinator = Coordinator::new(client, config(Duration::from_secs(60)));

        coordinator.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(125)).await;

        assert_eq!(coordinator.client().calls(), 2);
        assert_eq!(*coordinator.data().unwrap(), 2);
        assert!(coordinator.last_update_success());
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_after_shutdown_fails() {
        let coordinator =
            Coordinator::new(FakeClient::new(Duration::ZERO), config(Duration::from_secs(60)));
        coordinator.shutdown().await;

        let err = coordinator.start().await.unwrap_err();
        assert!(matches!(err, CoreError::Shutdown { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_after_shutdown_is_rejected() {
        let coordinator = Coordinator::new(FakeClient::new(Duration::ZERO), config(Duration::ZERO));
        coordinator.refresh().await.unwrap();
        coordinator.shutdown().await;

        let err = coordinator.refresh().await.unwrap_err();
        assert!(matches!(err, UpdateFailed::Shutdown { .. }));
        assert_eq!(coordinator.client().calls(), 1);
        assert!(coordinator.data().is_none());

        let err = coordinator.first_refresh().await.unwrap_err();
        assert!(matches!(err, CoreError::Shutdown { .. }));
        assert_eq!(coordinator.client().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_in_flight_at_shutdown_leaves_cache_empty() {
        let coordinator =
            Coordinator::new(FakeClient::new(Duration::from_secs(5)), config(Duration::ZERO));

        let pending = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.refresh().await }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        coordinator.shutdown().await;

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, UpdateFailed::Shutdown { .. }));
        assert_eq!(coordinator.client().calls(), 1);
        assert!(coordinator.data().is_none());
        assert_eq!(coordinator.store().health().attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_scheduled_fetch() {
        let client = FakeClient::new(Duration::from_secs(8));
        let coordinator = Coordinator::new(client, config(Duration::from_secs(60)));

        coordinator.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(coordinator.client().calls(), 1);

        let before = tokio::time::Instant::now();
        coordinator.shutdown().await;

        assert!(before.elapsed() < Duration::from_secs(1));
        assert!(coordinator.data().is_none());
        assert!(coordinator.is_shut_down());
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_new_status() {
        let coordinator = Coordinator::new(FakeClient::new(Duration::ZERO), config(Duration::ZERO));
        let mut stream = coordinator.subscribe();
        assert!(stream.current().is_none());

        coordinator.refresh().await.unwrap();

        let status = stream.changed().await.unwrap();
        assert_eq!(*status, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn health_reports_failures() {
        let client = FakeClient::new(Duration::ZERO).failing_on(&[1]);
        let coordinator = Coordinator::new(client, config(Duration::ZERO));
        let mut health = coordinator.health();

        let _ = coordinator.refresh().await;

        health.changed().await.unwrap();
        let snapshot = health.borrow_and_update().clone();
        assert_eq!(snapshot.attempts, 1);
        assert!(snapshot.last_error.is_some());
    }
}
