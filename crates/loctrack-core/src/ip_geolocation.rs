//! Coarse positioning from the public IP address.
//!
//! Talks to any endpoint that answers in the ip-api.com JSON shape:
//!
//! ```json
//! {"status": "success", "lat": 52.52, "lon": 13.40}
//! {"status": "fail", "message": "private range"}
//! ```
//!
//! Accuracy is city-level at best, which is enough for a desktop or server
//! host without a GNSS receiver.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use loctrack_types::Fix;

use crate::error::{Error, Result};
use crate::fix::FixRequest;
use crate::traits::PositionProvider;

/// Default lookup endpoint.
pub const DEFAULT_IP_GEOLOCATION_URL: &str = "http://ip-api.com/json";

/// IP lookups resolve to a city centroid; report it as a few kilometres.
const IP_FIX_ACCURACY_M: f32 = 5_000.0;

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

/// Position provider backed by an IP geolocation service.
///
/// The last successful fix is kept and served by
/// [`last_known_fix`](PositionProvider::last_known_fix).
#[derive(Debug)]
pub struct IpGeolocationProvider {
    client: Client,
    url: String,
    last_fix: RwLock<Option<Fix>>,
}

impl IpGeolocationProvider {
    /// Create a provider for the given endpoint.
    pub fn new(url: &str) -> Result<Self> {
        let url = url.trim_end_matches('/').to_string();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::InvalidConfig(format!(
                "URL must start with http:// or https://, got: {}",
                url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url,
            last_fix: RwLock::new(None),
        })
    }

    /// The endpoint this provider queries.
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn parse_response(body: IpApiResponse) -> Result<Option<Fix>> {
    if body.status != "success" {
        let message = body.message.unwrap_or_else(|| body.status.clone());
        return Err(Error::FixFailed(format!("IP lookup failed: {}", message)));
    }

    match (body.lat, body.lon) {
        (Some(lat), Some(lon)) => Ok(Some(Fix::new(lat, lon)?.with_accuracy(IP_FIX_ACCURACY_M))),
        _ => Ok(None),
    }
}

#[async_trait]
impl PositionProvider for IpGeolocationProvider {
    async fn request_fix(&self, _request: &FixRequest) -> Result<Option<Fix>> {
        debug!("Requesting IP geolocation from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;
        let body: IpApiResponse = response.json().await?;

        let fix = parse_response(body)?;
        if let Some(fix) = fix {
            *self.last_fix.write().await = Some(fix);
        }
        Ok(fix)
    }

    async fn last_known_fix(&self) -> Result<Option<Fix>> {
        Ok(*self.last_fix.read().await)
    }
}
