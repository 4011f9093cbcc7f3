//! Reverse geocoding via OpenStreetMap Nominatim.
//!
//! Nominatim's usage policy requires an identifying `User-Agent`, so the
//! resolver refuses to build without one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::AddressResolver;

/// Public Nominatim instance.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Address resolver backed by a Nominatim `/reverse` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimResolver {
    client: Client,
    base_url: String,
    language: Option<String>,
}

impl NominatimResolver {
    /// Create a resolver.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Nominatim root, e.g. [`DEFAULT_NOMINATIM_URL`]
    /// * `user_agent` - identifying agent string sent with every request
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidConfig(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }
        if user_agent.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "Nominatim requires a non-empty User-Agent".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url,
            language: None,
        })
    }

    /// Ask for results in the given language (`accept-language`).
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        self.language = (!language.trim().is_empty()).then_some(language);
        self
    }

    fn reverse_url(&self) -> String {
        format!("{}/reverse", self.base_url)
    }
}

fn address_lines(body: ReverseResponse) -> Result<Vec<String>> {
    if let Some(error) = body.error {
        // "Unable to geocode" is Nominatim's way of saying nothing is there.
        if error.contains("Unable to geocode") {
            return Ok(Vec::new());
        }
        return Err(Error::Geocode(error));
    }
    Ok(body.display_name.into_iter().collect())
}

#[async_trait]
impl AddressResolver for NominatimResolver {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<Vec<String>> {
        let mut query = vec![
            ("format", "jsonv2".to_string()),
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
        ];
        if let Some(language) = &self.language {
            query.push(("accept-language", language.clone()));
        }

        debug!("Reverse geocoding {}, {}", latitude, longitude);

        let response = self
            .client
            .get(self.reverse_url())
            .query(&query)
            .send()
            .await?
            .error_for_status()?;
        let body: ReverseResponse = response.json().await?;

        address_lines(body)
    }
}
