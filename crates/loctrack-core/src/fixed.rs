//! Provider for stationary installs with known coordinates.

use async_trait::async_trait;

use loctrack_types::{Fix, FixSource};

use crate::error::Result;
use crate::fix::FixRequest;
use crate::traits::PositionProvider;

/// Always reports the same configured position.
#[derive(Debug, Clone, Copy)]
pub struct FixedPositionProvider {
    fix: Fix,
}

impl FixedPositionProvider {
    /// Create a provider pinned to the given coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        Ok(Self {
            fix: Fix::new(latitude, longitude)?,
        })
    }
}

#[async_trait]
impl PositionProvider for FixedPositionProvider {
    async fn request_fix(&self, _request: &FixRequest) -> Result<Option<Fix>> {
        Ok(Some(self.fix))
    }

    async fn last_known_fix(&self) -> Result<Option<Fix>> {
        Ok(Some(self.fix.with_source(FixSource::Cached)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_provider_reports_configured_position() {
        let provider = FixedPositionProvider::new(48.8584, 2.2945).unwrap();
        let fix = provider
            .request_fix(&FixRequest::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!((fix.latitude, fix.longitude), (48.8584, 2.2945));

        let cached = provider.last_known_fix().await.unwrap().unwrap();
        assert_eq!(cached.source, FixSource::Cached);
    }

    #[test]
    fn test_fixed_provider_validates() {
        assert!(FixedPositionProvider::new(0.0, 181.0).is_err());
    }
}
