// Dashboard sync - Keeps the dashboard snapshot fresh
use crate::application::auth_session::AuthSession;
use crate::application::scale_backend::ScaleBackend;
use crate::application::scheduler::{RefreshTrigger, Scheduler};
use crate::domain::dashboard::DashboardSnapshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    pub snapshot: Arc<DashboardSnapshot>,
    pub is_loading: bool,
}

#[derive(Clone)]
pub struct DashboardSync {
    inner: Arc<SyncInner>,
}

struct SyncInner {
    backend: Arc<dyn ScaleBackend>,
    session: AuthSession,
    state: watch::Sender<DashboardState>,
    in_flight: AtomicUsize,
}

impl SyncInner {
    // The flag is recomputed under the watch lock so the last writer always
    // sees the latest counter.
    fn publish_loading(&self) {
        self.state.send_if_modified(|state| {
            let loading = self.in_flight.load(Ordering::SeqCst) > 0;
            let changed = state.is_loading != loading;
            state.is_loading = loading;
            changed
        });
    }
}

/// Counts one refresh as in flight until dropped, including on abort.
struct InFlight<'a> {
    inner: &'a SyncInner,
}

impl<'a> InFlight<'a> {
    fn begin(inner: &'a SyncInner) -> Self {
        inner.in_flight.fetch_add(1, Ordering::SeqCst);
        inner.publish_loading();
        Self { inner }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.inner.publish_loading();
    }
}

impl DashboardSync {
    pub fn new(backend: Arc<dyn ScaleBackend>, session: AuthSession) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            inner: Arc::new(SyncInner {
                backend,
                session,
                state,
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    pub fn state(&self) -> DashboardState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.inner.state.subscribe()
    }

    pub async fn refresh(&self) {
        self.refresh_with(RefreshTrigger::Manual).await;
    }

    /// Fetch and replace the whole snapshot. Any failure resets it to the
    /// offline default. Overlapping calls are allowed; the last one to
    /// complete wins.
    pub async fn refresh_with(&self, trigger: RefreshTrigger) {
        let _in_flight = InFlight::begin(&self.inner);
        let secret = self.inner.session.secret();

        let snapshot = match self.inner.backend.fetch_dashboard(&secret).await {
            Ok(snapshot) => {
                tracing::debug!("Dashboard refreshed ({})", trigger);
                snapshot
            }
            Err(e) => {
                tracing::warn!("Dashboard refresh ({}) failed, showing offline: {}", trigger, e);
                DashboardSnapshot::default()
            }
        };

        self.inner.state.send_if_modified(|state| {
            if *state.snapshot == snapshot {
                return false;
            }
            state.snapshot = Arc::new(snapshot);
            true
        });
    }

    /// Refresh once now, then on every tick of `period`, on every focus
    /// event and whenever the session secret changes, until the scheduler
    /// is shut down.
    pub fn mount(
        &self,
        scheduler: &mut Scheduler,
        period: Duration,
        focus: broadcast::Receiver<()>,
    ) {
        let sync = self.clone();
        scheduler.spawn("dashboard-sync", async move {
            sync.run(period, focus).await;
        });
    }

    async fn run(self, period: Duration, mut focus: broadcast::Receiver<()>) {
        let mut credential = self.inner.session.subscribe();
        let mut secret = credential.borrow_and_update().secret.clone();
        self.refresh_with(RefreshTrigger::Initial).await;

        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut listening = true;
        let mut watching = true;

        loop {
            let trigger = tokio::select! {
                _ = ticker.tick() => RefreshTrigger::Timer,
                event = focus.recv(), if listening => match event {
                    Ok(()) | Err(RecvError::Lagged(_)) => RefreshTrigger::WindowFocus,
                    Err(RecvError::Closed) => {
                        listening = false;
                        continue;
                    }
                },
                changed = credential.changed(), if watching => {
                    if changed.is_err() {
                        watching = false;
                        continue;
                    }
                    // Status-only transitions do not change what the backend shows
                    let current = credential.borrow_and_update().secret.clone();
                    if current == secret {
                        continue;
                    }
                    secret = current;
                    RefreshTrigger::CredentialChange
                },
            };

            self.refresh_with(trigger).await;

            // Focus events queued during the refresh are already served
            while matches!(focus.try_recv(), Ok(()) | Err(TryRecvError::Lagged(_))) {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::scale_backend::BackendError;
    use crate::application::scheduler::FocusSignal;
    use crate::domain::dashboard::BankBalance;
    use crate::test_support::{rejected, transport, FakeScaleBackend, MemoryCredentialStore};

    fn snapshot(beers_left: i64) -> DashboardSnapshot {
        DashboardSnapshot {
            is_ok: true,
            beers_left,
            ..DashboardSnapshot::default()
        }
    }

    fn setup() -> (Arc<FakeScaleBackend>, AuthSession, DashboardSync) {
        let backend = Arc::new(FakeScaleBackend::new());
        let session = AuthSession::new(backend.clone(), Arc::new(MemoryCredentialStore::default()));
        let sync = DashboardSync::new(backend.clone(), session.clone());
        (backend, session, sync)
    }

    #[tokio::test]
    async fn test_refresh_replaces_then_failure_resets_to_default() {
        let (backend, _, sync) = setup();
        backend.push_dashboard(Ok(snapshot(12)));
        backend.push_dashboard(Err(transport("dashboard")));

        sync.refresh().await;
        let shown = sync.state().snapshot;
        assert!(shown.is_ok);
        assert_eq!(shown.beers_left, 12);

        sync.refresh().await;
        let shown = sync.state().snapshot;
        assert!(!shown.is_ok);
        assert_eq!(shown.beers_left, 0);
        assert_eq!(*shown, DashboardSnapshot::default());
        assert!(!sync.state().is_loading);
    }

    #[tokio::test]
    async fn test_decode_and_status_failures_reset_to_default() {
        let (backend, _, sync) = setup();
        for failure in [
            rejected("dashboard", 500),
            BackendError::Decode {
                endpoint: "dashboard",
                message: "missing field `is_ok`".to_string(),
            },
        ] {
            backend.push_dashboard(Ok(snapshot(7)));
            backend.push_dashboard(Err(failure));

            sync.refresh().await;
            assert_eq!(sync.state().snapshot.beers_left, 7);
            sync.refresh().await;
            assert_eq!(*sync.state().snapshot, DashboardSnapshot::default());
        }
    }

    #[tokio::test]
    async fn test_refresh_carries_current_secret() {
        let (backend, session, sync) = setup();
        sync.refresh().await;

        backend.accept_password("abc123");
        session.login("abc123").await;
        sync.refresh().await;

        assert_eq!(backend.dashboard_calls(), vec!["".to_string(), "abc123".to_string()]);
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_last_completion_wins() {
        let (backend, _, sync) = setup();
        let release_first = backend.push_dashboard_gated(Ok(snapshot(1)));
        let release_second = backend.push_dashboard_gated(Ok(snapshot(2)));

        let first = tokio::spawn({
            let sync = sync.clone();
            async move { sync.refresh().await }
        });
        backend.wait_for_calls(1).await;
        let second = tokio::spawn({
            let sync = sync.clone();
            async move { sync.refresh().await }
        });
        backend.wait_for_calls(2).await;
        assert!(sync.state().is_loading);

        release_second.send(()).unwrap();
        second.await.unwrap();
        assert_eq!(sync.state().snapshot.beers_left, 2);
        // The first request is still outstanding
        assert!(sync.state().is_loading);

        release_first.send(()).unwrap();
        first.await.unwrap();
        assert_eq!(sync.state().snapshot.beers_left, 1);
        assert!(!sync.state().is_loading);
    }

    #[tokio::test]
    async fn test_aborted_refresh_does_not_leave_loading_stuck() {
        let (backend, _, sync) = setup();
        let _release = backend.push_dashboard_gated(Ok(snapshot(3)));

        let pending = tokio::spawn({
            let sync = sync.clone();
            async move { sync.refresh().await }
        });
        backend.wait_for_calls(1).await;
        assert!(sync.state().is_loading);

        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());
        assert!(!sync.state().is_loading);
        assert_eq!(*sync.state().snapshot, DashboardSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_refreshes_until_teardown() {
        let (backend, _, sync) = setup();
        let focus = FocusSignal::new();
        let mut scheduler = Scheduler::new();

        sync.mount(&mut scheduler, Duration::from_secs(10), focus.subscribe());
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(backend.dashboard_calls().len(), 3);

        scheduler.shutdown();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.dashboard_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_secret_change_refetches_without_protected_fields() {
        let (backend, session, sync) = setup();
        backend.accept_password("abc123");
        backend.push_dashboard(Ok(snapshot(5)));
        backend.push_dashboard(Ok(DashboardSnapshot {
            bank_balance: Some(BankBalance {
                balance: "1520".to_string(),
            }),
            ..snapshot(5)
        }));
        let focus = FocusSignal::new();
        let mut scheduler = Scheduler::new();
        let mut updates = sync.subscribe();

        sync.mount(&mut scheduler, Duration::from_secs(3600), focus.subscribe());
        backend.wait_for_calls(1).await;

        session.login("abc123").await;
        updates
            .wait_for(|state| state.snapshot.bank_balance.is_some())
            .await
            .unwrap();

        session.logout();
        updates
            .wait_for(|state| state.snapshot.bank_balance.is_none())
            .await
            .unwrap();

        assert_eq!(backend.dashboard_calls(), vec!["", "abc123", ""]);
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_focus_triggers_refresh() {
        let (backend, _, sync) = setup();
        backend.push_dashboard(Ok(snapshot(5)));
        backend.push_dashboard(Ok(snapshot(4)));
        let focus = FocusSignal::new();
        let mut scheduler = Scheduler::new();

        sync.mount(&mut scheduler, Duration::from_secs(3600), focus.subscribe());
        backend.wait_for_calls(1).await;

        focus.notify();
        backend.wait_for_calls(2).await;

        let mut updates = sync.subscribe();
        updates
            .wait_for(|state| state.snapshot.beers_left == 4)
            .await
            .unwrap();
        scheduler.shutdown();
    }
}
