//! Today's samples, as shown to the user.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use loctrack_store::Store;
use loctrack_types::{LocationSample, clock};

use crate::state::AppState;

pub use loctrack_types::clock::start_of_day;

/// Snapshot of today's samples and the tracking flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayView {
    /// Whether tracking is shown as active.
    pub tracking_active: bool,
    /// Samples since local midnight, newest first.
    pub samples: Vec<LocationSample>,
}

impl TodayView {
    /// Load samples captured since local midnight.
    pub fn load(store: &Store) -> loctrack_store::Result<Self> {
        Self::load_since(store, clock::start_of_today())
    }

    /// Load samples captured since midnight of `now`'s day, in `now`'s zone.
    pub fn load_at<Tz: TimeZone>(store: &Store, now: &DateTime<Tz>) -> loctrack_store::Result<Self> {
        Self::load_since(store, start_of_day(now))
    }

    fn load_since(store: &Store, start_ms: i64) -> loctrack_store::Result<Self> {
        Ok(Self {
            tracking_active: false,
            samples: store.list_since(start_ms)?,
        })
    }

    /// Set the tracking flag.
    #[must_use]
    pub fn with_tracking(mut self, active: bool) -> Self {
        self.tracking_active = active;
        self
    }

    /// Plain-text list for the terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let status = if self.tracking_active { "active" } else { "stopped" };
        let _ = writeln!(out, "Tracking: {}", status);
        out.push_str(&self.render_list());
        out
    }

    /// The sample list without the tracking line.
    pub fn render_list(&self) -> String {
        if self.samples.is_empty() {
            return "No locations recorded today\n".to_string();
        }

        let mut out = String::new();
        let noun = if self.samples.len() == 1 { "sample" } else { "samples" };
        let _ = writeln!(out, "Today: {} {}", self.samples.len(), noun);
        for sample in &self.samples {
            let _ = writeln!(out, "{}", sample);
        }
        out
    }
}

/// Reload today's view now and after every lifecycle change.
///
/// Runs until `cancel` fires or the signal is dropped.
pub fn watch_today<F>(state: Arc<AppState>, cancel: CancellationToken, mut on_view: F) -> JoinHandle<()>
where
    F: FnMut(TodayView) + Send + 'static,
{
    let mut rx = state.tracking.subscribe();

    tokio::spawn(async move {
        loop {
            rx.borrow_and_update();
            let active = state.tracking.is_active();

            let loaded = {
                let store = state.store.lock().await;
                TodayView::load(&store)
            };
            match loaded {
                Ok(view) => on_view(view.with_tracking(active)),
                Err(e) => warn!("Failed to load today's samples: {}", e),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    })
}
