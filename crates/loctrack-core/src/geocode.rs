//! Address resolution policy.

use async_trait::async_trait;
use tracing::{debug, warn};

use loctrack_types::UNKNOWN_LOCATION;

use crate::error::Result;
use crate::traits::AddressResolver;

/// Resolve coordinates to a single address string.
///
/// Non-empty lines are joined with `", "`. Errors and empty results yield
/// [`UNKNOWN_LOCATION`]; this never fails.
pub async fn resolve_address<R>(resolver: &R, latitude: f64, longitude: f64) -> String
where
    R: AddressResolver + ?Sized,
{
    match resolver.resolve(latitude, longitude).await {
        Ok(lines) => {
            let parts: Vec<&str> = lines
                .iter()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .collect();
            if parts.is_empty() {
                debug!("No address found for {}, {}", latitude, longitude);
                UNKNOWN_LOCATION.to_string()
            } else {
                parts.join(", ")
            }
        }
        Err(e) => {
            warn!("Error getting address: {}", e);
            UNKNOWN_LOCATION.to_string()
        }
    }
}

/// Resolver that never finds anything. Every sample gets the sentinel.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineResolver;

#[async_trait]
impl AddressResolver for OfflineResolver {
    async fn resolve(&self, _latitude: f64, _longitude: f64) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockResolver;

    #[tokio::test]
    async fn test_lines_joined() {
        let resolver = MockResolver::with_lines(["123 Main St", "Springfield"]);
        assert_eq!(
            resolve_address(&resolver, 10.0, 20.0).await,
            "123 Main St, Springfield"
        );
    }

    #[tokio::test]
    async fn test_single_line() {
        let resolver = MockResolver::with_lines(["Rådhuspladsen 1, København"]);
        assert_eq!(
            resolve_address(&resolver, 55.67, 12.56).await,
            "Rådhuspladsen 1, København"
        );
    }

    #[tokio::test]
    async fn test_blank_lines_skipped() {
        let resolver = MockResolver::with_lines(["  ", "Harbour Rd", ""]);
        assert_eq!(resolve_address(&resolver, 0.0, 0.0).await, "Harbour Rd");
    }

    #[tokio::test]
    async fn test_empty_result_uses_sentinel() {
        let resolver = MockResolver::with_lines(Vec::<String>::new());
        assert_eq!(resolve_address(&resolver, 0.0, 0.0).await, UNKNOWN_LOCATION);
    }

    #[tokio::test]
    async fn test_error_uses_sentinel() {
        let resolver = MockResolver::failing("service unavailable");
        assert_eq!(resolve_address(&resolver, 0.0, 0.0).await, UNKNOWN_LOCATION);
        assert_eq!(resolver.call_count(), 1);
    }

    #[tokio::test]
    async fn test_offline_resolver() {
        assert_eq!(
            resolve_address(&OfflineResolver, 1.0, 1.0).await,
            UNKNOWN_LOCATION
        );
    }
}
