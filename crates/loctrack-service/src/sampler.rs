//! Periodic location sampling loop.
//!
//! One [`Sampler`] owns at most one running loop. Each iteration runs, in
//! order: permission check, fix acquisition (fresh, then last known),
//! timestamp capture, reverse geocoding, persistence, observer notification.
//! Only fix acquisition, geocoding and the inter-iteration sleep race against
//! cancellation; once a sample is written the observer is always told.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use loctrack_core::{
    AddressResolver, FixRequest, PermissionGate, PositionProvider, acquire_fix, resolve_address,
};
use loctrack_types::{
    AccuracyPriority, LocationSample, NewSample, TrackingState, UNKNOWN_LOCATION, clock,
};

use crate::config::TrackingConfig;
use crate::state::AppState;

/// Default wait for a fresh fix before falling back.
pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_secs(30);

/// Shortest interval a loop will sleep between iterations.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

const UPDATE_SLACK: Duration = Duration::from_secs(60);

/// Parameters fixed for the lifetime of one loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingOptions {
    /// Time between iterations.
    pub interval: Duration,
    /// Accuracy hint for the provider.
    pub accuracy: AccuracyPriority,
    /// Fastest rate at which fixes are consumed.
    pub min_update_interval: Duration,
    /// Longest the provider may delay a fix.
    pub max_update_delay: Duration,
    /// Upper bound on the fresh-fix attempt.
    pub fix_timeout: Duration,
}

impl SamplingOptions {
    /// Options for the given interval.
    ///
    /// Update bounds are one minute either side of the interval; the lower
    /// bound floors at zero. Intervals below [`MIN_INTERVAL`] are raised to it.
    pub fn new(interval: Duration) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        Self {
            interval,
            accuracy: AccuracyPriority::HighAccuracy,
            min_update_interval: interval.saturating_sub(UPDATE_SLACK),
            max_update_delay: interval.saturating_add(UPDATE_SLACK),
            fix_timeout: DEFAULT_FIX_TIMEOUT,
        }
    }

    /// Options for an interval given in minutes, at least one.
    pub fn every_minutes(minutes: u64) -> Self {
        Self::new(Duration::from_secs(minutes.max(1).saturating_mul(60)))
    }

    /// Set the accuracy hint.
    #[must_use]
    pub fn with_accuracy(mut self, accuracy: AccuracyPriority) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Set the fresh-fix timeout.
    #[must_use]
    pub fn with_fix_timeout(mut self, timeout: Duration) -> Self {
        self.fix_timeout = timeout;
        self
    }

    /// The request handed to the provider each iteration.
    pub fn fix_request(&self) -> FixRequest {
        FixRequest {
            accuracy: self.accuracy,
            min_update_interval: self.min_update_interval,
            max_update_delay: self.max_update_delay,
            timeout: self.fix_timeout,
        }
    }
}

impl From<&TrackingConfig> for SamplingOptions {
    fn from(config: &TrackingConfig) -> Self {
        Self::new(config.interval())
            .with_accuracy(config.accuracy)
            .with_fix_timeout(config.fix_timeout())
    }
}

/// What one completed iteration produced.
#[derive(Debug, Clone, PartialEq)]
pub enum IterationOutcome {
    /// A sample was stored.
    Captured(LocationSample),
    /// Location permission was not granted.
    PermissionDenied,
    /// Neither a fresh nor a last-known fix was available.
    NoFix,
    /// A fix was captured but could not be stored.
    StoreFault(String),
}

impl IterationOutcome {
    /// The stored sample, or `None` for every kind of failure.
    pub fn sample(&self) -> Option<&LocationSample> {
        match self {
            IterationOutcome::Captured(sample) => Some(sample),
            _ => None,
        }
    }

    /// Whether a sample was stored.
    pub fn is_captured(&self) -> bool {
        matches!(self, IterationOutcome::Captured(_))
    }

    /// Human-readable failure reason.
    pub fn error_message(&self) -> Option<String> {
        match self {
            IterationOutcome::Captured(_) => None,
            IterationOutcome::PermissionDenied => Some(SampleError::PermissionDenied.to_string()),
            IterationOutcome::NoFix => Some(SampleError::NoFix.to_string()),
            IterationOutcome::StoreFault(message) => {
                Some(format!("Failed to store sample: {}", message))
            }
        }
    }
}

/// Why an iteration did not store a sample.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("Location permission not granted")]
    PermissionDenied,
    #[error("No location available")]
    NoFix,
    #[error("Sampling cancelled")]
    Cancelled,
    #[error("Failed to store sample: {0}")]
    Store(#[from] loctrack_store::Error),
}

/// Callback invoked once per completed iteration.
pub type SampleObserver = Arc<dyn Fn(&IterationOutcome) + Send + Sync>;

/// Restartable background sampler.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use loctrack_core::{MockPositionProvider, MockResolver, PermissionSwitch};
/// use loctrack_service::{AppState, Sampler, SamplingOptions};
/// use loctrack_store::Store;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let state = AppState::new(Store::open_in_memory()?);
///     let sampler = Sampler::new(
///         Arc::clone(&state),
///         Arc::new(MockPositionProvider::at(10.0, 20.0)?),
///         Arc::new(MockResolver::with_lines(["123 Main St"])),
///         Arc::new(PermissionSwitch::default()),
///     );
///
///     sampler
///         .start(SamplingOptions::every_minutes(1), |outcome| {
///             println!("{:?}", outcome.sample());
///         })
///         .await;
///     sampler.stop().await;
///     Ok(())
/// }
/// ```
pub struct Sampler {
    state: Arc<AppState>,
    provider: Arc<dyn PositionProvider>,
    resolver: Arc<dyn AddressResolver>,
    permission: Arc<dyn PermissionGate>,
    active: Mutex<Option<ActiveLoop>>,
}

struct ActiveLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ActiveLoop {
    /// Cancel the loop and wait until its task has exited.
    async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.handle).await
            && e.is_panic()
        {
            error!("Sampling loop panicked: {}", e);
        }
    }
}

// A sampler dropped while running must not leave a detached writer behind.
impl Drop for ActiveLoop {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Sampler {
    /// Create an idle sampler.
    pub fn new(
        state: Arc<AppState>,
        provider: Arc<dyn PositionProvider>,
        resolver: Arc<dyn AddressResolver>,
        permission: Arc<dyn PermissionGate>,
    ) -> Self {
        Self {
            state,
            provider,
            resolver,
            permission,
            active: Mutex::new(None),
        }
    }

    /// Shared state this sampler writes to.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Start sampling.
    ///
    /// A loop that is already running is cancelled and awaited first, so two
    /// loops never write concurrently. The first iteration runs immediately.
    pub async fn start<F>(&self, options: SamplingOptions, on_sample: F)
    where
        F: Fn(&IterationOutcome) + Send + Sync + 'static,
    {
        let mut active = self.active.lock().await;

        if let Some(previous) = active.take() {
            info!("Restarting sampling loop");
            previous.shutdown().await;
            self.state.stats.write().await.mark_stopped();
            self.state.tracking.publish(TrackingState::Stopped);
        }

        let cancel = CancellationToken::new();
        let worker = LoopWorker {
            state: Arc::clone(&self.state),
            provider: Arc::clone(&self.provider),
            resolver: Arc::clone(&self.resolver),
            permission: Arc::clone(&self.permission),
            observer: Arc::new(on_sample),
        };

        self.state.stats.write().await.mark_started();
        self.state.tracking.publish(TrackingState::Started);

        let handle = tokio::spawn(worker.run(options, cancel.clone()));
        *active = Some(ActiveLoop { cancel, handle });
    }

    /// Stop sampling.
    ///
    /// Returns `false` (and publishes nothing) when no loop was running.
    pub async fn stop(&self) -> bool {
        let mut active = self.active.lock().await;

        match active.take() {
            Some(running) => {
                running.shutdown().await;
                self.state.stats.write().await.mark_stopped();
                self.state.tracking.publish(TrackingState::Stopped);
                info!("Sampling loop stopped");
                true
            }
            None => {
                debug!("Stop requested but no sampling loop is running");
                false
            }
        }
    }

    /// Whether a loop is currently running.
    pub async fn is_running(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }
}

struct LoopWorker {
    state: Arc<AppState>,
    provider: Arc<dyn PositionProvider>,
    resolver: Arc<dyn AddressResolver>,
    permission: Arc<dyn PermissionGate>,
    observer: SampleObserver,
}

impl LoopWorker {
    async fn run(self, options: SamplingOptions, cancel: CancellationToken) {
        info!(
            "Starting sampling loop (interval: {}s, accuracy: {})",
            options.interval.as_secs(),
            options.accuracy
        );

        let request = options.fix_request();

        loop {
            let outcome = match self.sample_once(&request, &cancel).await {
                Ok(sample) => IterationOutcome::Captured(sample),
                Err(SampleError::Cancelled) => break,
                Err(SampleError::PermissionDenied) => IterationOutcome::PermissionDenied,
                Err(SampleError::NoFix) => IterationOutcome::NoFix,
                Err(SampleError::Store(e)) => IterationOutcome::StoreFault(e.to_string()),
            };

            let consecutive_misses = self.state.stats.write().await.record(&outcome);
            log_outcome(&outcome, consecutive_misses);

            (self.observer)(&outcome);
            self.state.tracking.publish(TrackingState::Updated);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(options.interval) => {}
            }
        }

        debug!("Sampling loop exited");
    }

    /// Run one iteration and persist the sample.
    async fn sample_once(
        &self,
        request: &FixRequest,
        cancel: &CancellationToken,
    ) -> Result<LocationSample, SampleError> {
        if !self.permission.has_location_permission() {
            return Err(SampleError::PermissionDenied);
        }

        let fix = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SampleError::Cancelled),
            fix = acquire_fix(self.provider.as_ref(), request) => fix,
        };
        let fix = fix.ok_or(SampleError::NoFix)?;

        let timestamp = clock::now_millis();
        let formatted_time = clock::format_timestamp(timestamp);

        let address = if self.permission.has_location_permission() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SampleError::Cancelled),
                address = resolve_address(self.resolver.as_ref(), fix.latitude, fix.longitude) => address,
            }
        } else {
            debug!("Permission revoked before geocoding, using placeholder address");
            UNKNOWN_LOCATION.to_string()
        };

        let sample = NewSample {
            latitude: fix.latitude,
            longitude: fix.longitude,
            address,
            timestamp,
            formatted_time,
        };

        let id = {
            let store = self.state.store.lock().await;
            store.append(&sample)?
        };

        Ok(sample.with_id(id))
    }
}

fn log_outcome(outcome: &IterationOutcome, consecutive_misses: u32) {
    match outcome {
        IterationOutcome::Captured(sample) => {
            debug!(
                "Stored sample {}: {:.6}, {:.6} ({})",
                sample.id, sample.latitude, sample.longitude, sample.address
            );
        }
        IterationOutcome::StoreFault(message) => {
            error!("Failed to store sample: {}", message);
        }
        IterationOutcome::PermissionDenied | IterationOutcome::NoFix => {
            let reason = outcome.error_message().unwrap_or_default();
            if consecutive_misses <= 3 {
                warn!("No sample taken: {} (attempt {})", reason, consecutive_misses);
            } else if consecutive_misses == 4 {
                error!(
                    "No sample taken after {} attempts, will continue trying silently",
                    consecutive_misses
                );
            } else {
                debug!("No sample taken: {} (attempt {})", reason, consecutive_misses);
            }
        }
    }
}
