//! Tracker configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use loctrack_types::AccuracyPriority;

/// Tracker configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sampling cadence and accuracy.
    pub tracking: TrackingConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Where fixes come from.
    pub provider: ProviderConfig,
    /// How coordinates become addresses.
    pub geocoder: GeocoderConfig,
    /// Location permission.
    pub permission: PermissionConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - Sampling interval is between 1 minute and 1 day
    /// - Fix timeout is between 1 second and 10 minutes
    /// - Storage path is not empty
    /// - Provider and geocoder URLs are http(s)
    /// - Fixed-position coordinates are present and in range
    /// - A geocoder user agent is set when Nominatim is used
    ///
    /// # Example
    ///
    /// ```
    /// use loctrack_service::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.tracking.validate());
        errors.extend(self.storage.validate());
        errors.extend(self.provider.validate());
        errors.extend(self.geocoder.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Minimum sampling interval in minutes.
pub const MIN_INTERVAL_MINUTES: u64 = 1;
/// Maximum sampling interval in minutes (1 day).
pub const MAX_INTERVAL_MINUTES: u64 = 24 * 60;
/// Maximum fix timeout in seconds (10 minutes).
pub const MAX_FIX_TIMEOUT_SECS: u64 = 600;

/// Sampling cadence and accuracy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Minutes between samples.
    pub interval_minutes: u64,
    /// Accuracy hint for the provider.
    pub accuracy: AccuracyPriority,
    /// Seconds to wait for a fresh fix before falling back.
    pub fix_timeout_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 1,
            accuracy: AccuracyPriority::HighAccuracy,
            fix_timeout_secs: 30,
        }
    }
}

impl TrackingConfig {
    /// The sampling interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    /// The fresh-fix timeout.
    pub fn fix_timeout(&self) -> Duration {
        Duration::from_secs(self.fix_timeout_secs)
    }

    /// Validate tracking configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.interval_minutes < MIN_INTERVAL_MINUTES {
            errors.push(ValidationError {
                field: "tracking.interval_minutes".to_string(),
                message: format!(
                    "interval {} is too short (minimum {} minute)",
                    self.interval_minutes, MIN_INTERVAL_MINUTES
                ),
            });
        } else if self.interval_minutes > MAX_INTERVAL_MINUTES {
            errors.push(ValidationError {
                field: "tracking.interval_minutes".to_string(),
                message: format!(
                    "interval {} is too long (maximum {} minutes / 1 day)",
                    self.interval_minutes, MAX_INTERVAL_MINUTES
                ),
            });
        }

        if self.fix_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "tracking.fix_timeout_secs".to_string(),
                message: "fix timeout cannot be 0".to_string(),
            });
        } else if self.fix_timeout_secs > MAX_FIX_TIMEOUT_SECS {
            errors.push(ValidationError {
                field: "tracking.fix_timeout_secs".to_string(),
                message: format!(
                    "fix timeout {} is too long (maximum {} seconds)",
                    self.fix_timeout_secs, MAX_FIX_TIMEOUT_SECS
                ),
            });
        }

        errors
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: loctrack_store::default_db_path(),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.path".to_string(),
                message: "database path cannot be empty".to_string(),
            });
        }

        errors
    }
}

/// Available positioning providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Coarse position from the public IP address.
    #[default]
    Ip,
    /// Configured coordinates.
    Fixed,
}

/// Positioning provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Which provider to use.
    pub kind: ProviderKind,
    /// Lookup endpoint for the IP provider.
    pub url: String,
    /// Latitude for the fixed provider.
    pub latitude: Option<f64>,
    /// Longitude for the fixed provider.
    pub longitude: Option<f64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Ip,
            url: "http://ip-api.com/json".to_string(),
            latitude: None,
            longitude: None,
        }
    }
}

impl ProviderConfig {
    /// Validate provider configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        match self.kind {
            ProviderKind::Ip => {
                if let Some(error) = validate_url("provider.url", &self.url) {
                    errors.push(error);
                }
            }
            ProviderKind::Fixed => {
                errors.extend(validate_coordinate(
                    "provider.latitude",
                    self.latitude,
                    90.0,
                ));
                errors.extend(validate_coordinate(
                    "provider.longitude",
                    self.longitude,
                    180.0,
                ));
            }
        }

        errors
    }
}

/// Available reverse geocoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocoderKind {
    /// OpenStreetMap Nominatim.
    #[default]
    Nominatim,
    /// No lookups; every sample gets the sentinel address.
    Offline,
}

/// Reverse geocoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Which geocoder to use.
    pub kind: GeocoderKind,
    /// Nominatim root URL.
    pub url: String,
    /// Identifying User-Agent sent to Nominatim.
    pub user_agent: String,
    /// Preferred result language (e.g. "en", "de").
    pub language: Option<String>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            kind: GeocoderKind::Nominatim,
            url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: format!("loctrack/{}", env!("CARGO_PKG_VERSION")),
            language: None,
        }
    }
}

impl GeocoderConfig {
    /// Validate geocoder configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.kind == GeocoderKind::Nominatim {
            if let Some(error) = validate_url("geocoder.url", &self.url) {
                errors.push(error);
            }
            if self.user_agent.trim().is_empty() {
                errors.push(ValidationError {
                    field: "geocoder.user_agent".to_string(),
                    message: "user agent cannot be empty when using nominatim".to_string(),
                });
            }
        }

        if let Some(language) = &self.language
            && language.is_empty()
        {
            errors.push(ValidationError {
                field: "geocoder.language".to_string(),
                message: "language cannot be empty string (use null/omit instead)".to_string(),
            });
        }

        errors
    }
}

/// Location permission configuration.
///
/// Desktop hosts have no runtime prompt; the grant is read from here and can
/// be revoked while running.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionConfig {
    /// Whether the tracker may read the location.
    pub location_granted: bool,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            location_granted: true,
        }
    }
}

fn validate_url(field: &str, url: &str) -> Option<ValidationError> {
    if url.is_empty() {
        Some(ValidationError {
            field: field.to_string(),
            message: "URL cannot be empty".to_string(),
        })
    } else if !url.starts_with("http://") && !url.starts_with("https://") {
        Some(ValidationError {
            field: field.to_string(),
            message: format!("URL must start with http:// or https://, got: {}", url),
        })
    } else {
        None
    }
}

fn validate_coordinate(field: &str, value: Option<f64>, limit: f64) -> Option<ValidationError> {
    match value {
        None => Some(ValidationError {
            field: field.to_string(),
            message: "required when provider.kind = \"fixed\"".to_string(),
        }),
        Some(v) if !v.is_finite() || v.abs() > limit => Some(ValidationError {
            field: field.to_string(),
            message: format!("{} is out of range (-{limit} to {limit})", v),
        }),
        Some(_) => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `tracking.interval_minutes`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("loctrack")
        .join("tracker.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_fields(config: &Config) -> Vec<String> {
        match config.validate() {
            Err(ConfigError::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(()) => Vec::new(),
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.tracking.interval_minutes, 1);
        assert_eq!(config.tracking.accuracy, AccuracyPriority::HighAccuracy);
        assert_eq!(config.provider.kind, ProviderKind::Ip);
        assert_eq!(config.geocoder.kind, GeocoderKind::Nominatim);
        assert!(config.permission.location_granted);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.path, loctrack_store::default_db_path());
    }

    #[test]
    fn test_tracking_durations() {
        let tracking = TrackingConfig {
            interval_minutes: 2,
            fix_timeout_secs: 45,
            ..Default::default()
        };
        assert_eq!(tracking.interval(), Duration::from_secs(120));
        assert_eq!(tracking.fix_timeout(), Duration::from_secs(45));
    }

    #[test]
    fn test_config_full_toml() {
        let toml = r#"
            [tracking]
            interval_minutes = 5
            accuracy = "balanced"
            fix_timeout_secs = 20

            [storage]
            path = "/data/samples.db"

            [provider]
            kind = "fixed"
            latitude = 59.3293
            longitude = 18.0686

            [geocoder]
            kind = "offline"

            [permission]
            location_granted = false
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.tracking.interval_minutes, 5);
        assert_eq!(config.tracking.accuracy, AccuracyPriority::Balanced);
        assert_eq!(config.storage.path, PathBuf::from("/data/samples.db"));
        assert_eq!(config.provider.kind, ProviderKind::Fixed);
        assert_eq!(config.provider.latitude, Some(59.3293));
        assert_eq!(config.geocoder.kind, GeocoderKind::Offline);
        assert!(!config.permission.location_granted);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[tracking]\ninterval_minutes = 2\n").unwrap();
        assert_eq!(config.tracking.interval_minutes, 2);
        assert_eq!(config.tracking.fix_timeout_secs, 30);
        assert_eq!(config.provider.url, "http://ip-api.com/json");
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("tracker.toml");

        let mut config = Config::default();
        config.tracking.interval_minutes = 10;
        config.storage.path = PathBuf::from("/tmp/test.db");
        config.geocoder.language = Some("de".to_string());

        config.save(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();

        assert_eq!(loaded.tracking.interval_minutes, 10);
        assert_eq!(loaded.storage.path, PathBuf::from("/tmp/test.db"));
        assert_eq!(loaded.geocoder.language.as_deref(), Some("de"));
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/tracker.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&config_path, "this is not valid { toml").unwrap();

        let result = Config::load(&config_path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_validated_rejects_bad_interval() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("tracker.toml");
        std::fs::write(&config_path, "[tracking]\ninterval_minutes = 0\n").unwrap();

        let result = Config::load_validated(&config_path);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_interval_bounds() {
        let mut config = Config::default();
        config.tracking.interval_minutes = 0;
        assert_eq!(validation_fields(&config), vec!["tracking.interval_minutes"]);

        config.tracking.interval_minutes = MAX_INTERVAL_MINUTES + 1;
        assert_eq!(validation_fields(&config), vec!["tracking.interval_minutes"]);

        config.tracking.interval_minutes = MAX_INTERVAL_MINUTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_fix_timeout() {
        let mut config = Config::default();
        config.tracking.fix_timeout_secs = 0;
        assert_eq!(validation_fields(&config), vec!["tracking.fix_timeout_secs"]);

        config.tracking.fix_timeout_secs = MAX_FIX_TIMEOUT_SECS + 1;
        assert_eq!(validation_fields(&config), vec!["tracking.fix_timeout_secs"]);
    }

    #[test]
    fn test_validate_empty_storage_path() {
        let mut config = Config::default();
        config.storage.path = PathBuf::new();
        assert_eq!(validation_fields(&config), vec!["storage.path"]);
    }

    #[test]
    fn test_validate_fixed_provider_coordinates() {
        let mut config = Config::default();
        config.provider.kind = ProviderKind::Fixed;
        assert_eq!(
            validation_fields(&config),
            vec!["provider.latitude", "provider.longitude"]
        );

        config.provider.latitude = Some(91.0);
        config.provider.longitude = Some(-180.0);
        assert_eq!(validation_fields(&config), vec!["provider.latitude"]);

        config.provider.latitude = Some(-90.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_urls() {
        let mut config = Config::default();
        config.provider.url = "ip-api.com/json".to_string();
        config.geocoder.url = String::new();
        assert_eq!(
            validation_fields(&config),
            vec!["provider.url", "geocoder.url"]
        );
    }

    #[test]
    fn test_offline_geocoder_skips_url_checks() {
        let mut config = Config::default();
        config.geocoder.kind = GeocoderKind::Offline;
        config.geocoder.url = String::new();
        config.geocoder.user_agent = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_user_agent_and_language() {
        let mut config = Config::default();
        config.geocoder.user_agent = "  ".to_string();
        config.geocoder.language = Some(String::new());
        assert_eq!(
            validation_fields(&config),
            vec!["geocoder.user_agent", "geocoder.language"]
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::Validation(vec![
            ValidationError {
                field: "tracking.interval_minutes".to_string(),
                message: "too short".to_string(),
            },
            ValidationError {
                field: "storage.path".to_string(),
                message: "empty".to_string(),
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("  - tracking.interval_minutes: too short"));
        assert!(msg.contains("  - storage.path: empty"));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("loctrack/tracker.toml"));
    }
}
