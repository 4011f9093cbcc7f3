//! End-to-end tests for the sampling loop, the lifecycle signal and the host.
//!
//! All tests run on a paused clock, so minute-long intervals pass instantly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use loctrack_core::{
    AddressResolver, Fix, FixRequest, MockPositionProvider, MockResolver, MockResponse,
    PermissionSwitch, PositionProvider, UNKNOWN_LOCATION,
};
use loctrack_service::host::{STARTING_TEXT, UNAVAILABLE_TEXT};
use loctrack_service::{
    AppState, ForegroundHost, HostCommand, IndicatorEvent, IterationOutcome,
    RecordingIndicator, Sampler, SamplingOptions, TodayView,
};
use loctrack_store::Store;
use loctrack_types::{TrackingState, clock};

fn setup(
    provider: Arc<dyn PositionProvider>,
    resolver: Arc<dyn AddressResolver>,
    permission: Arc<PermissionSwitch>,
) -> (Arc<AppState>, Sampler) {
    let state = AppState::new(Store::open_in_memory().unwrap());
    let sampler = Sampler::new(Arc::clone(&state), provider, resolver, permission);
    (state, sampler)
}

async fn start_collecting(
    sampler: &Sampler,
    options: SamplingOptions,
) -> mpsc::UnboundedReceiver<IterationOutcome> {
    let (tx, rx) = mpsc::unbounded_channel();
    sampler
        .start(options, move |outcome| {
            let _ = tx.send(outcome.clone());
        })
        .await;
    rx
}

async fn wait_for(rx: &mut watch::Receiver<Option<TrackingState>>, want: TrackingState) {
    loop {
        if *rx.borrow_and_update() == Some(want) {
            return;
        }
        rx.changed().await.unwrap();
    }
}

fn fix(latitude: f64, longitude: f64) -> Fix {
    Fix::new(latitude, longitude).unwrap()
}

/// Provider that records how many fresh requests are in flight at once.
struct CountingProvider {
    latency: Duration,
    calls: AtomicU32,
    in_flight: AtomicU32,
    max_in_flight: AtomicU32,
}

struct InFlight<'a>(&'a AtomicU32);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CountingProvider {
    fn new(latency: Duration) -> Self {
        Self {
            latency,
            calls: AtomicU32::new(0),
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl PositionProvider for CountingProvider {
    async fn request_fix(&self, _request: &FixRequest) -> loctrack_core::Result<Option<Fix>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);
        self.calls.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(self.latency).await;
        Ok(Some(fix(1.0, 2.0)))
    }

    async fn last_known_fix(&self) -> loctrack_core::Result<Option<Fix>> {
        Ok(None)
    }
}

#[tokio::test(start_paused = true)]
async fn first_iteration_stores_geocoded_sample() {
    let (state, sampler) = setup(
        Arc::new(MockPositionProvider::at(10.0, 20.0).unwrap()),
        Arc::new(MockResolver::with_lines(["123 Main St", "Springfield"])),
        Arc::new(PermissionSwitch::default()),
    );

    let calls = Arc::new(AtomicU32::new(0));
    let observed = Arc::clone(&calls);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let before = clock::now_millis();
    sampler
        .start(SamplingOptions::every_minutes(1), move |outcome| {
            observed.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(outcome.clone());
        })
        .await;

    let outcome = rx.recv().await.unwrap();
    let after = clock::now_millis();
    assert!(sampler.stop().await);

    let sample = outcome.sample().unwrap().clone();
    assert_eq!(sample.latitude, 10.0);
    assert_eq!(sample.longitude, 20.0);
    assert_eq!(sample.address, "123 Main St, Springfield");
    assert!(sample.timestamp >= before && sample.timestamp <= after);
    assert_eq!(sample.formatted_time, clock::format_timestamp(sample.timestamp));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let store = state.store.lock().await;
    assert_eq!(store.most_recent().unwrap(), Some(sample.clone()));
    assert_eq!(TodayView::load(&store).unwrap().samples, vec![sample]);
}

#[tokio::test(start_paused = true)]
async fn iterations_follow_the_interval() {
    let (state, sampler) = setup(
        Arc::new(MockPositionProvider::at(1.0, 1.0).unwrap()),
        Arc::new(MockResolver::with_lines(["Somewhere"])),
        Arc::new(PermissionSwitch::default()),
    );

    let started = tokio::time::Instant::now();
    let mut rx = start_collecting(&sampler, SamplingOptions::every_minutes(2)).await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let outcome = rx.recv().await.unwrap();
        ids.push(outcome.sample().unwrap().id);
    }
    sampler.stop().await;

    assert!(started.elapsed() >= Duration::from_secs(4 * 60));
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

    let stored = state.store.lock().await.list_all().unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[0].id, ids[2]);
}

#[tokio::test(start_paused = true)]
async fn falls_back_to_last_known_fix() {
    let provider = Arc::new(
        MockPositionProvider::new()
            .with_fresh(MockResponse::Fail("no satellites".to_string()))
            .with_last_known(Some(fix(48.85, 2.35))),
    );
    let (state, sampler) = setup(
        provider.clone(),
        Arc::new(MockResolver::with_lines(["Paris"])),
        Arc::new(PermissionSwitch::default()),
    );

    let mut rx = start_collecting(&sampler, SamplingOptions::every_minutes(1)).await;
    let outcome = rx.recv().await.unwrap();
    sampler.stop().await;

    let sample = outcome.sample().unwrap();
    assert_eq!((sample.latitude, sample.longitude), (48.85, 2.35));
    assert_eq!(provider.fresh_count(), 1);
    assert_eq!(provider.last_known_count(), 1);
    assert_eq!(state.store.lock().await.count_samples().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn no_fix_writes_nothing() {
    let provider = Arc::new(
        MockPositionProvider::new()
            .with_fresh(MockResponse::Cancelled)
            .with_last_known(None),
    );
    let resolver = Arc::new(MockResolver::with_lines(["Unused"]));
    let (state, sampler) = setup(
        provider,
        resolver.clone(),
        Arc::new(PermissionSwitch::default()),
    );

    let mut rx = start_collecting(&sampler, SamplingOptions::every_minutes(1)).await;
    let outcome = rx.recv().await.unwrap();
    sampler.stop().await;

    assert_eq!(outcome, IterationOutcome::NoFix);
    assert!(outcome.sample().is_none());
    assert_eq!(resolver.call_count(), 0);
    assert_eq!(state.store.lock().await.count_samples().unwrap(), 0);

    let stats = state.stats.read().await.clone();
    assert_eq!(stats.miss_count, 1);
    assert_eq!(stats.consecutive_misses, 1);
}

#[tokio::test(start_paused = true)]
async fn geocode_failure_still_persists() {
    let (state, sampler) = setup(
        Arc::new(MockPositionProvider::at(35.68, 139.69).unwrap()),
        Arc::new(MockResolver::failing("quota exceeded")),
        Arc::new(PermissionSwitch::default()),
    );

    let mut rx = start_collecting(&sampler, SamplingOptions::every_minutes(1)).await;
    let outcome = rx.recv().await.unwrap();
    sampler.stop().await;

    assert_eq!(outcome.sample().unwrap().address, UNKNOWN_LOCATION);
    let stored = state.store.lock().await.most_recent().unwrap().unwrap();
    assert!(stored.has_unknown_address());
}

#[tokio::test(start_paused = true)]
async fn store_fault_is_reported_and_loop_continues() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("samples.db");
    let state = AppState::new(Store::open(&db_path).unwrap());
    let sampler = Sampler::new(
        Arc::clone(&state),
        Arc::new(MockPositionProvider::at(1.0, 2.0).unwrap()),
        Arc::new(MockResolver::with_lines(["X"])),
        Arc::new(PermissionSwitch::default()),
    );

    // A second writer holding the database keeps appends failing.
    let locker = rusqlite::Connection::open(&db_path).unwrap();
    locker.execute_batch("BEGIN EXCLUSIVE").unwrap();

    let mut rx = start_collecting(&sampler, SamplingOptions::every_minutes(1)).await;
    let first = rx.recv().await.unwrap();
    assert!(matches!(first, IterationOutcome::StoreFault(_)), "{:?}", first);
    assert!(first.sample().is_none());
    {
        let stats = state.stats.read().await;
        assert_eq!(stats.store_fault_count, 1);
        assert_eq!(stats.miss_count, 0);
        assert!(stats.running);
    }

    locker.execute_batch("COMMIT").unwrap();
    drop(locker);

    assert!(rx.recv().await.unwrap().is_captured());
    sampler.stop().await;

    assert_eq!(state.store.lock().await.count_samples().unwrap(), 1);
    let stats = state.stats.read().await;
    assert_eq!(stats.store_fault_count, 1);
    assert_eq!(stats.success_count, 1);
}

#[tokio::test(start_paused = true)]
async fn missing_permission_aborts_iteration_only() {
    let provider = Arc::new(MockPositionProvider::at(1.0, 2.0).unwrap());
    let permission = Arc::new(PermissionSwitch::new(false));
    let (state, sampler) = setup(
        provider.clone(),
        Arc::new(MockResolver::with_lines(["X"])),
        permission.clone(),
    );

    let mut rx = start_collecting(&sampler, SamplingOptions::every_minutes(1)).await;
    assert_eq!(rx.recv().await, Some(IterationOutcome::PermissionDenied));
    assert_eq!(rx.recv().await, Some(IterationOutcome::PermissionDenied));
    assert_eq!(provider.fresh_count(), 0);

    permission.grant();
    assert!(rx.recv().await.unwrap().is_captured());
    sampler.stop().await;

    assert_eq!(state.store.lock().await.count_samples().unwrap(), 1);
    assert_eq!(state.stats.read().await.consecutive_misses, 0);
}

#[tokio::test(start_paused = true)]
async fn restart_cancels_previous_loop_first() {
    let provider = Arc::new(CountingProvider::new(Duration::from_secs(10)));
    let (state, sampler) = setup(
        provider.clone(),
        Arc::new(MockResolver::with_lines(["X"])),
        Arc::new(PermissionSwitch::default()),
    );

    let mut first = start_collecting(&sampler, SamplingOptions::every_minutes(1)).await;
    while provider.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(provider.in_flight.load(Ordering::SeqCst), 1);

    let mut second = start_collecting(&sampler, SamplingOptions::every_minutes(1)).await;

    // The first loop was cancelled mid-fix and never reported.
    assert!(first.recv().await.is_none());

    assert!(second.recv().await.unwrap().is_captured());
    sampler.stop().await;

    assert_eq!(provider.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    assert_eq!(state.store.lock().await.count_samples().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_without_start_is_a_noop() {
    let (state, sampler) = setup(
        Arc::new(MockPositionProvider::new()),
        Arc::new(MockResolver::with_lines(["X"])),
        Arc::new(PermissionSwitch::default()),
    );

    assert!(!sampler.stop().await);
    assert!(!sampler.stop().await);
    assert_eq!(state.tracking.current(), None);
    assert!(!state.stats.read().await.running);
}

#[tokio::test(start_paused = true)]
async fn stop_interrupts_sleep_from_another_task() {
    let (state, sampler) = setup(
        Arc::new(MockPositionProvider::at(1.0, 1.0).unwrap()),
        Arc::new(MockResolver::with_lines(["X"])),
        Arc::new(PermissionSwitch::default()),
    );
    let sampler = Arc::new(sampler);

    let started = tokio::time::Instant::now();
    let mut rx = start_collecting(&sampler, SamplingOptions::every_minutes(60)).await;
    rx.recv().await.unwrap();

    let stopper = Arc::clone(&sampler);
    let stopped = tokio::spawn(async move { stopper.stop().await })
        .await
        .unwrap();

    assert!(stopped);
    assert!(started.elapsed() < Duration::from_secs(60));
    assert!(rx.recv().await.is_none());
    assert!(!sampler.stop().await);
    assert_eq!(state.tracking.current(), Some(TrackingState::Stopped));
    assert!(!state.tracking.is_active());
}

#[tokio::test(start_paused = true)]
async fn lifecycle_signal_follows_the_loop() {
    let (state, sampler) = setup(
        Arc::new(MockPositionProvider::at(1.0, 1.0).unwrap()),
        Arc::new(MockResolver::with_lines(["X"])),
        Arc::new(PermissionSwitch::default()),
    );
    let mut signal = state.tracking.subscribe();

    let _rx = start_collecting(&sampler, SamplingOptions::every_minutes(1)).await;
    assert!(state.tracking.is_active());

    wait_for(&mut signal, TrackingState::Updated).await;
    assert!(state.tracking.is_active());

    sampler.stop().await;
    wait_for(&mut signal, TrackingState::Stopped).await;
    assert!(!state.tracking.is_active());
}

#[tokio::test(start_paused = true)]
async fn host_commands_are_idempotent() {
    let (state, sampler) = setup(
        Arc::new(MockPositionProvider::at(10.5, 20.25).unwrap()),
        Arc::new(MockResolver::with_lines(["X"])),
        Arc::new(PermissionSwitch::default()),
    );
    let indicator = Arc::new(RecordingIndicator::new());
    let host = ForegroundHost::new(
        Arc::new(sampler),
        indicator.clone(),
        SamplingOptions::every_minutes(1),
    );
    let mut signal = state.tracking.subscribe();

    assert!(!host.handle(HostCommand::StopTracking).await);
    assert!(indicator.events().is_empty());

    assert!(host.handle(HostCommand::StartTracking).await);
    wait_for(&mut signal, TrackingState::Updated).await;
    assert!(!host.handle(HostCommand::StartTracking).await);
    assert_eq!(indicator.current().as_deref(), Some("Location: 10.5, 20.25"));

    assert!(host.handle(HostCommand::StopTracking).await);
    assert!(!host.handle(HostCommand::StopTracking).await);

    assert_eq!(
        indicator.events(),
        vec![
            IndicatorEvent::Shown(STARTING_TEXT.to_string()),
            IndicatorEvent::Shown("Location: 10.5, 20.25".to_string()),
            IndicatorEvent::Cleared,
        ]
    );
    assert_eq!(state.tracking.current(), Some(TrackingState::Stopped));
    assert_eq!(state.store.lock().await.count_samples().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn host_shows_unavailable_without_fix() {
    let (state, sampler) = setup(
        Arc::new(MockPositionProvider::new()),
        Arc::new(MockResolver::with_lines(["X"])),
        Arc::new(PermissionSwitch::default()),
    );
    let indicator = Arc::new(RecordingIndicator::new());
    let host = ForegroundHost::new(
        Arc::new(sampler),
        indicator.clone(),
        SamplingOptions::every_minutes(1),
    );
    let mut signal = state.tracking.subscribe();

    host.handle(HostCommand::StartTracking).await;
    wait_for(&mut signal, TrackingState::Updated).await;
    assert_eq!(indicator.current().as_deref(), Some(UNAVAILABLE_TEXT));

    host.handle(HostCommand::StopTracking).await;
}
