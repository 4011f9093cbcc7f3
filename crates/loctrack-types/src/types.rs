//! Core types for location samples and tracking state.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ParseResult};

/// Address stored when reverse geocoding is unavailable or returns nothing.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Where a fix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FixSource {
    /// An on-demand fix requested for this cycle.
    Fresh,
    /// The provider's most recently cached position.
    Cached,
}

impl fmt::Display for FixSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixSource::Fresh => write!(f, "fresh"),
            FixSource::Cached => write!(f, "cached"),
        }
    }
}

/// A single resolved position.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fix {
    /// Latitude in degrees, -90..=90.
    pub latitude: f64,
    /// Longitude in degrees, -180..=180.
    pub longitude: f64,
    /// Horizontal accuracy radius in meters, if the provider reports one.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub accuracy_m: Option<f32>,
    /// Fresh or cached.
    pub source: FixSource,
}

impl Fix {
    /// Create a fresh fix, validating the coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctrack_types::Fix;
    ///
    /// let fix = Fix::new(55.6761, 12.5683).unwrap();
    /// assert_eq!(fix.latitude, 55.6761);
    ///
    /// assert!(Fix::new(91.0, 0.0).is_err());
    /// assert!(Fix::new(0.0, f64::NAN).is_err());
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> ParseResult<Self> {
        check_axis("latitude", latitude, 90.0)?;
        check_axis("longitude", longitude, 180.0)?;
        Ok(Self {
            latitude,
            longitude,
            accuracy_m: None,
            source: FixSource::Fresh,
        })
    }

    /// Set the accuracy radius.
    #[must_use]
    pub fn with_accuracy(mut self, meters: f32) -> Self {
        self.accuracy_m = Some(meters);
        self
    }

    /// Mark the fix as coming from the given source.
    #[must_use]
    pub fn with_source(mut self, source: FixSource) -> Self {
        self.source = source;
        self
    }
}

fn check_axis(axis: &'static str, value: f64, limit: f64) -> ParseResult<()> {
    if value.is_finite() && value.abs() <= limit {
        Ok(())
    } else {
        Err(ParseError::InvalidCoordinate {
            axis,
            value,
            min: -limit,
            max: limit,
        })
    }
}

/// Accuracy hint passed to the positioning provider.
///
/// Mirrors the priority levels offered by mobile fused location providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AccuracyPriority {
    /// Most accurate position available, highest power use.
    #[default]
    HighAccuracy,
    /// Block-level accuracy.
    Balanced,
    /// City-level accuracy.
    LowPower,
    /// Only positions computed for other clients.
    Passive,
}

impl fmt::Display for AccuracyPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccuracyPriority::HighAccuracy => "high_accuracy",
            AccuracyPriority::Balanced => "balanced",
            AccuracyPriority::LowPower => "low_power",
            AccuracyPriority::Passive => "passive",
        };
        f.write_str(s)
    }
}

impl FromStr for AccuracyPriority {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "high_accuracy" | "high" => Ok(AccuracyPriority::HighAccuracy),
            "balanced" => Ok(AccuracyPriority::Balanced),
            "low_power" | "low" => Ok(AccuracyPriority::LowPower),
            "passive" => Ok(AccuracyPriority::Passive),
            _ => Err(ParseError::UnknownVariant {
                kind: "accuracy priority",
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle signal broadcast to observers of the sampling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrackingState {
    /// The sampling loop started.
    #[cfg_attr(feature = "serde", serde(rename = "start"))]
    Started,
    /// The sampling loop stopped.
    #[cfg_attr(feature = "serde", serde(rename = "stop"))]
    Stopped,
    /// An iteration completed (with or without a sample).
    #[cfg_attr(feature = "serde", serde(rename = "update"))]
    Updated,
}

impl TrackingState {
    /// Wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingState::Started => "start",
            TrackingState::Stopped => "stop",
            TrackingState::Updated => "update",
        }
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingState {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<Self> {
        match s {
            "start" => Ok(TrackingState::Started),
            "stop" => Ok(TrackingState::Stopped),
            "update" => Ok(TrackingState::Updated),
            _ => Err(ParseError::UnknownVariant {
                kind: "tracking state",
                value: s.to_string(),
            }),
        }
    }
}

/// A captured sample that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NewSample {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Resolved address or [`UNKNOWN_LOCATION`].
    pub address: String,
    /// Capture time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Local rendering of `timestamp`, fixed at capture time.
    pub formatted_time: String,
}

impl NewSample {
    /// Attach the store-assigned id.
    pub fn with_id(self, id: i64) -> LocationSample {
        LocationSample {
            id,
            latitude: self.latitude,
            longitude: self.longitude,
            address: self.address,
            timestamp: self.timestamp,
            formatted_time: self.formatted_time,
        }
    }
}

/// A persisted location sample.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocationSample {
    /// Store-assigned id, increasing with insertion order.
    pub id: i64,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Resolved address or [`UNKNOWN_LOCATION`].
    pub address: String,
    /// Capture time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Local rendering of `timestamp`, fixed at capture time.
    pub formatted_time: String,
}

impl LocationSample {
    /// Whether reverse geocoding failed for this sample.
    pub fn has_unknown_address(&self) -> bool {
        self.address == UNKNOWN_LOCATION
    }
}

impl fmt::Display for LocationSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {:.6}, {:.6}  {}",
            self.formatted_time, self.latitude, self.longitude, self.address
        )
    }
}
