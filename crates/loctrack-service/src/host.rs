//! Foreground execution host.
//!
//! Keeps the sampling loop alive and mirrors its progress in an ongoing
//! status indicator. The host accepts exactly two commands, both idempotent.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use loctrack_types::{ParseError, ParseResult};

use crate::sampler::{IterationOutcome, Sampler, SamplingOptions};

/// Indicator text shown while the first fix is pending.
pub const STARTING_TEXT: &str = "Starting location tracking...";
/// Indicator text after an iteration without a sample.
pub const UNAVAILABLE_TEXT: &str = "Location: Unavailable";

/// Commands accepted by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    StartTracking,
    StopTracking,
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostCommand::StartTracking => f.write_str("start"),
            HostCommand::StopTracking => f.write_str("stop"),
        }
    }
}

impl FromStr for HostCommand {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "start_tracking" => Ok(HostCommand::StartTracking),
            "stop" | "stop_tracking" => Ok(HostCommand::StopTracking),
            _ => Err(ParseError::UnknownVariant {
                kind: "host command",
                value: s.to_string(),
            }),
        }
    }
}

/// Ongoing, user-visible status line.
pub trait StatusIndicator: Send + Sync {
    /// Show or replace the status text.
    fn show(&self, text: &str);

    /// Remove the indicator.
    fn clear(&self);
}

/// Writes status changes to stderr.
#[derive(Debug, Default)]
pub struct TerminalIndicator;

impl StatusIndicator for TerminalIndicator {
    fn show(&self, text: &str) {
        eprintln!("[loctrack] {}", text);
    }

    fn clear(&self) {
        eprintln!("[loctrack] Tracking stopped");
    }
}

/// Something that happened to a [`RecordingIndicator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorEvent {
    Shown(String),
    Cleared,
}

/// Keeps every indicator change in memory.
#[derive(Debug, Default)]
pub struct RecordingIndicator {
    events: Mutex<Vec<IndicatorEvent>>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All changes, oldest first.
    pub fn events(&self) -> Vec<IndicatorEvent> {
        self.lock().clone()
    }

    /// Text currently shown, if the indicator is visible.
    pub fn current(&self) -> Option<String> {
        match self.lock().last() {
            Some(IndicatorEvent::Shown(text)) => Some(text.clone()),
            _ => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<IndicatorEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StatusIndicator for RecordingIndicator {
    fn show(&self, text: &str) {
        self.lock().push(IndicatorEvent::Shown(text.to_string()));
    }

    fn clear(&self) {
        self.lock().push(IndicatorEvent::Cleared);
    }
}

/// Indicator text for an iteration outcome.
pub fn status_text(outcome: &IterationOutcome) -> String {
    match outcome.sample() {
        Some(sample) => format!("Location: {}, {}", sample.latitude, sample.longitude),
        None => UNAVAILABLE_TEXT.to_string(),
    }
}

/// Host that owns the sampler and the status indicator.
pub struct ForegroundHost {
    sampler: Arc<Sampler>,
    indicator: Arc<dyn StatusIndicator>,
    options: SamplingOptions,
    commands: tokio::sync::Mutex<()>,
}

impl ForegroundHost {
    /// Create a host that starts loops with `options`.
    pub fn new(
        sampler: Arc<Sampler>,
        indicator: Arc<dyn StatusIndicator>,
        options: SamplingOptions,
    ) -> Self {
        Self {
            sampler,
            indicator,
            options,
            commands: tokio::sync::Mutex::new(()),
        }
    }

    /// The sampler driven by this host.
    pub fn sampler(&self) -> &Arc<Sampler> {
        &self.sampler
    }

    /// Apply a command. Returns `true` if tracking changed state.
    pub async fn handle(&self, command: HostCommand) -> bool {
        let _serial = self.commands.lock().await;

        match command {
            HostCommand::StartTracking => {
                if self.sampler.is_running().await {
                    debug!("Start requested but tracking is already running");
                    return false;
                }

                info!(
                    "Starting foreground tracking (every {}s)",
                    self.options.interval.as_secs()
                );
                self.indicator.show(STARTING_TEXT);

                let indicator = Arc::clone(&self.indicator);
                self.sampler
                    .start(self.options.clone(), move |outcome| {
                        indicator.show(&status_text(outcome));
                    })
                    .await;
                true
            }
            HostCommand::StopTracking => {
                if self.sampler.stop().await {
                    self.indicator.clear();
                    info!("Foreground tracking stopped");
                    true
                } else {
                    false
                }
            }
        }
    }
}
