//! Trait abstractions for the sampling loop's collaborators.
//!
//! These traits let the loop run against real providers (HTTP services,
//! fixed coordinates) and against the mocks in [`crate::mock`].
//!
//! # Example
//!
//! ```ignore
//! use loctrack_core::{FixRequest, PositionProvider, Result};
//!
//! async fn print_fix<P: PositionProvider>(provider: &P) -> Result<()> {
//!     if let Some(fix) = provider.request_fix(&FixRequest::default()).await? {
//!         println!("{}, {}", fix.latitude, fix.longitude);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;

use loctrack_types::Fix;

use crate::error::Result;
use crate::fix::FixRequest;

/// Source of position fixes.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// Request a fresh, on-demand fix.
    ///
    /// `Ok(None)` means the provider finished without a position.
    /// Cancellation is reported as [`Error::Cancelled`](crate::Error::Cancelled).
    async fn request_fix(&self, request: &FixRequest) -> Result<Option<Fix>>;

    /// The most recently cached position, if the provider has one.
    async fn last_known_fix(&self) -> Result<Option<Fix>>;
}

/// Reverse geocoder turning coordinates into address lines.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Resolve coordinates to ordered address lines.
    ///
    /// An empty list means nothing was found.
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<Vec<String>>;
}

/// Gate checked before every fix attempt.
pub trait PermissionGate: Send + Sync {
    /// Whether location access is currently allowed.
    fn has_location_permission(&self) -> bool;
}
