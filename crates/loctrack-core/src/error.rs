//! Error types for loctrack-core.
//!
//! Positioning and geocoding failures are expected during normal operation:
//! the sampling loop absorbs them at the iteration boundary. The variants
//! here exist so collaborators can say *why* they came back empty.
//!
//! | Error | Treatment in the sampling loop |
//! |-------|--------------------------------|
//! | [`Error::FixFailed`] | Fall back to the last-known fix |
//! | [`Error::Cancelled`] | Fall back to the last-known fix |
//! | [`Error::Timeout`] | Fall back to the last-known fix |
//! | [`Error::Geocode`] | Substitute the sentinel address |
//! | [`Error::Http`] | Depends on the caller (fix or geocode) |
//! | [`Error::InvalidResponse`] | Depends on the caller (fix or geocode) |
//! | [`Error::InvalidConfig`] | Fix configuration and restart |

use std::time::Duration;

use thiserror::Error;

/// Errors raised by positioning, geocoding and permission collaborators.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The provider could not produce a fix.
    #[error("Fix request failed: {0}")]
    FixFailed(String),

    /// The request was cancelled by the provider or the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// Reverse geocoding failed.
    #[error("Geocoding failed: {0}")]
    Geocode(String),

    /// HTTP transport error.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A collaborator answered with something unusable.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias using loctrack-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<loctrack_types::ParseError> for Error {
    fn from(err: loctrack_types::ParseError) -> Self {
        Error::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout {
            operation: "request_fix".to_string(),
            duration: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "Operation 'request_fix' timed out after 30s");
    }

    #[test]
    fn test_parse_error_converts_to_invalid_response() {
        let parse = loctrack_types::Fix::new(100.0, 0.0).unwrap_err();
        let err: Error = parse.into();
        assert!(matches!(err, Error::InvalidResponse(msg) if msg.contains("latitude")));
    }
}
