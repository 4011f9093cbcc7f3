//! Error types for data parsing in loctrack-types.

use thiserror::Error;

/// Errors that can occur when building or parsing location data.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    /// Coordinate is NaN, infinite, or outside the valid range.
    #[error("Invalid {axis}: {value} (expected {min}..={max})")]
    InvalidCoordinate {
        axis: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A string did not name a known variant.
    #[error("Unknown {kind}: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}

/// Result type alias using loctrack-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
