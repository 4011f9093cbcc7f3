//! Fix acquisition with last-known fallback.
//!
//! The policy is fixed: ask the provider for a fresh fix first, bounded by
//! [`FixRequest::timeout`]. If that fails, times out, is cancelled, or yields
//! nothing, ask for the cached last-known position instead. Only when both
//! come back empty does the cycle count as a miss.

use std::time::Duration;

use tracing::{debug, warn};

use loctrack_types::{AccuracyPriority, Fix, FixSource};

use crate::error::Error;
use crate::traits::PositionProvider;

/// Parameters for a one-shot fix request.
#[derive(Debug, Clone, PartialEq)]
pub struct FixRequest {
    /// Accuracy hint for the provider.
    pub accuracy: AccuracyPriority,
    /// Fastest rate at which the caller will consume fixes.
    pub min_update_interval: Duration,
    /// Longest the provider may batch or delay a fix.
    pub max_update_delay: Duration,
    /// Upper bound on how long to wait for a fresh fix.
    pub timeout: Duration,
}

impl Default for FixRequest {
    fn default() -> Self {
        Self {
            accuracy: AccuracyPriority::HighAccuracy,
            min_update_interval: Duration::ZERO,
            max_update_delay: Duration::from_secs(3 * 60),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Acquire one fix: fresh first, then the provider's last-known position.
///
/// Errors from either attempt are logged and treated as "no fix". The
/// returned fix carries its [`FixSource`].
pub async fn acquire_fix<P>(provider: &P, request: &FixRequest) -> Option<Fix>
where
    P: PositionProvider + ?Sized,
{
    if let Some(fix) = request_fresh(provider, request).await {
        return Some(fix.with_source(FixSource::Fresh));
    }

    debug!("Fresh fix unavailable, falling back to last known location");

    match provider.last_known_fix().await {
        Ok(Some(fix)) => {
            debug!("Last known location available");
            Some(fix.with_source(FixSource::Cached))
        }
        Ok(None) => {
            debug!("Both fresh and last known location unavailable");
            None
        }
        Err(e) => {
            warn!("Last known location failed: {}", e);
            None
        }
    }
}

async fn request_fresh<P>(provider: &P, request: &FixRequest) -> Option<Fix>
where
    P: PositionProvider + ?Sized,
{
    let result = match tokio::time::timeout(request.timeout, provider.request_fix(request)).await
    {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation: "request_fix".to_string(),
            duration: request.timeout,
        }),
    };

    match result {
        Ok(Some(fix)) => Some(fix),
        Ok(None) => {
            debug!("Fresh fix request returned no location");
            None
        }
        Err(Error::Cancelled) => {
            debug!("Fresh fix request was cancelled");
            None
        }
        Err(e) => {
            warn!("Fresh fix request failed: {}", e);
            None
        }
    }
}
