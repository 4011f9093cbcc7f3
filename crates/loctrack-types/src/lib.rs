//! Platform-agnostic types for periodic location sampling.
//!
//! This crate provides the data types shared by the store, the collaborator
//! traits, and the sampling service.
//!
//! # Features
//!
//! - Position fixes with coordinate validation
//! - Captured and persisted location samples
//! - The lifecycle signal broadcast by the sampling loop
//! - Local-time formatting and day boundaries
//!
//! # Example
//!
//! ```
//! use loctrack_types::{Fix, FixSource, TrackingState};
//!
//! let fix = Fix::new(10.0, 20.0)?.with_source(FixSource::Cached);
//! assert_eq!(fix.source, FixSource::Cached);
//! assert_eq!("update".parse::<TrackingState>()?, TrackingState::Updated);
//! # Ok::<(), loctrack_types::ParseError>(())
//! ```

pub mod clock;
pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    AccuracyPriority, Fix, FixSource, LocationSample, NewSample, TrackingState, UNKNOWN_LOCATION,
};
