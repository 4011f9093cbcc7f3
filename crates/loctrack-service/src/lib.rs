//! Periodic location sampling with a foreground host.
//!
//! This crate provides a service that:
//! - Samples the location on a fixed interval, falling back to the last known fix
//! - Reverse-geocodes every fix, using a placeholder address when that fails
//! - Appends each sample to the local database
//! - Publishes a start/stop/update lifecycle signal
//! - Lists today's samples whenever the signal changes
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/loctrack/tracker.toml`:
//!
//! ```toml
//! [tracking]
//! interval_minutes = 1
//! accuracy = "high_accuracy"
//! fix_timeout_secs = 30
//!
//! [storage]
//! path = "~/.local/share/loctrack/samples.db"
//!
//! [provider]
//! kind = "ip"                      # or "fixed" with latitude/longitude
//! url = "http://ip-api.com/json"
//!
//! [geocoder]
//! kind = "nominatim"               # or "offline"
//! url = "https://nominatim.openstreetmap.org"
//! user_agent = "loctrack/0.1.0"
//!
//! [permission]
//! location_granted = true
//! ```

pub mod collaborators;
pub mod config;
pub mod host;
pub mod lifecycle;
pub mod sampler;
pub mod state;
pub mod today;

pub use config::{
    Config, ConfigError, GeocoderConfig, GeocoderKind, PermissionConfig, ProviderConfig,
    ProviderKind, StorageConfig, TrackingConfig, ValidationError,
};
pub use host::{
    ForegroundHost, HostCommand, IndicatorEvent, RecordingIndicator, StatusIndicator,
    TerminalIndicator,
};
pub use lifecycle::{ObserverHandle, TrackingSignal};
pub use sampler::{IterationOutcome, SampleError, SampleObserver, Sampler, SamplingOptions};
pub use state::{AppState, SamplerStats};
pub use today::{TodayView, start_of_day, watch_today};
