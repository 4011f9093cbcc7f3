//! Application state shared by the sampler, the host and the presentation surface.
//!
//! # Lifecycle Signal
//!
//! [`AppState::tracking`] is the only channel between the sampling loop and
//! its observers. It keeps the latest [`TrackingState`](loctrack_types::TrackingState)
//! only; an observer that falls behind sees the newest state, never a backlog.

use std::sync::Arc;

use loctrack_store::Store;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};

use crate::lifecycle::TrackingSignal;
use crate::sampler::IterationOutcome;

/// Shared application state.
pub struct AppState {
    /// The sample store (wrapped in Mutex so appends are serialised).
    pub store: Mutex<Store>,
    /// Tracking lifecycle signal.
    pub tracking: TrackingSignal,
    /// Sampling loop statistics.
    pub stats: RwLock<SamplerStats>,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: Store) -> Arc<Self> {
        Arc::new(Self {
            store: Mutex::new(store),
            tracking: TrackingSignal::new(),
            stats: RwLock::new(SamplerStats::default()),
        })
    }
}

/// Sampling loop statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SamplerStats {
    /// Whether a loop is currently running.
    pub running: bool,
    /// When the current (or last) loop was started.
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    /// Time of the last stored sample.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_sample_at: Option<OffsetDateTime>,
    /// Time of the last miss or store fault.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_error_at: Option<OffsetDateTime>,
    /// Last miss or store fault message.
    pub last_error: Option<String>,
    /// Total stored samples.
    pub success_count: u64,
    /// Iterations that ended without a fix or without permission.
    pub miss_count: u64,
    /// Iterations whose sample could not be stored.
    pub store_fault_count: u64,
    /// Misses since the last stored sample.
    pub consecutive_misses: u32,
}

impl SamplerStats {
    /// Record a loop start.
    pub fn mark_started(&mut self) {
        self.running = true;
        self.started_at = Some(OffsetDateTime::now_utc());
        self.consecutive_misses = 0;
    }

    /// Record a loop stop.
    pub fn mark_stopped(&mut self) {
        self.running = false;
    }

    /// Record an iteration outcome and return the consecutive miss count.
    pub fn record(&mut self, outcome: &IterationOutcome) -> u32 {
        let now = OffsetDateTime::now_utc();
        match outcome {
            IterationOutcome::Captured(_) => {
                self.success_count += 1;
                self.last_sample_at = Some(now);
                self.consecutive_misses = 0;
            }
            IterationOutcome::PermissionDenied | IterationOutcome::NoFix => {
                self.miss_count += 1;
                self.consecutive_misses += 1;
                self.last_error_at = Some(now);
                self.last_error = outcome.error_message();
            }
            IterationOutcome::StoreFault(_) => {
                self.store_fault_count += 1;
                self.last_error_at = Some(now);
                self.last_error = outcome.error_message();
            }
        }
        self.consecutive_misses
    }
}
