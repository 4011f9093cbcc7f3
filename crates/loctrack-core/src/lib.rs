//! Positioning, geocoding and permission collaborators for location sampling.
//!
//! This crate defines the seams the sampling loop talks through and the
//! policies applied on top of them:
//!
//! - **Fix acquisition**: fresh fix first, last-known fix as fallback
//! - **Address resolution**: joined address lines, sentinel on failure
//! - **Permission gate**: checked before every sampling iteration
//!
//! # Collaborators
//!
//! | Collaborator | Trait | Notes |
//! |--------------|-------|-------|
//! | [`IpGeolocationProvider`] | [`PositionProvider`] | Feature `http`; city-level accuracy |
//! | [`FixedPositionProvider`] | [`PositionProvider`] | Stationary installs |
//! | [`NominatimResolver`] | [`AddressResolver`] | Feature `http`; OpenStreetMap |
//! | [`OfflineResolver`] | [`AddressResolver`] | Always the sentinel address |
//! | [`PermissionSwitch`] | [`PermissionGate`] | Runtime grant/revoke |
//! | [`mock`] | all of the above | Failure injection for tests |
//!
//! # Quick Start
//!
//! ```
//! use loctrack_core::{FixRequest, FixedPositionProvider, OfflineResolver};
//! use loctrack_core::{acquire_fix, resolve_address};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = FixedPositionProvider::new(51.5007, -0.1246)?;
//!
//!     if let Some(fix) = acquire_fix(&provider, &FixRequest::default()).await {
//!         let address = resolve_address(&OfflineResolver, fix.latitude, fix.longitude).await;
//!         println!("{}, {}: {}", fix.latitude, fix.longitude, address);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod fix;
pub mod fixed;
pub mod geocode;
#[cfg(feature = "http")]
pub mod ip_geolocation;
pub mod mock;
#[cfg(feature = "http")]
pub mod nominatim;
pub mod permission;
pub mod traits;

pub use error::{Error, Result};
pub use fix::{FixRequest, acquire_fix};
pub use fixed::FixedPositionProvider;
pub use geocode::{OfflineResolver, resolve_address};
#[cfg(feature = "http")]
pub use ip_geolocation::{DEFAULT_IP_GEOLOCATION_URL, IpGeolocationProvider};
pub use mock::{MockPositionProvider, MockResolver, MockResponse};
#[cfg(feature = "http")]
pub use nominatim::{DEFAULT_NOMINATIM_URL, NominatimResolver};
pub use permission::PermissionSwitch;
pub use traits::{AddressResolver, PermissionGate, PositionProvider};

// Re-export from loctrack-types
pub use loctrack_types::{AccuracyPriority, Fix, FixSource, UNKNOWN_LOCATION};
