//! Build the sampler's collaborators from configuration.

use std::sync::Arc;

use tracing::info;

use loctrack_core::{
    AddressResolver, Error, FixedPositionProvider, OfflineResolver, PermissionSwitch,
    PositionProvider, Result,
};

use crate::config::{GeocoderConfig, GeocoderKind, PermissionConfig, ProviderConfig, ProviderKind};

/// Positioning provider selected by `[provider]`.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn PositionProvider>> {
    match config.kind {
        ProviderKind::Fixed => {
            let (Some(latitude), Some(longitude)) = (config.latitude, config.longitude) else {
                return Err(Error::InvalidConfig(
                    "provider.latitude and provider.longitude are required for the fixed provider"
                        .to_string(),
                ));
            };
            info!("Using fixed position {}, {}", latitude, longitude);
            Ok(Arc::new(FixedPositionProvider::new(latitude, longitude)?))
        }
        ProviderKind::Ip => ip_provider(&config.url),
    }
}

#[cfg(feature = "http")]
fn ip_provider(url: &str) -> Result<Arc<dyn PositionProvider>> {
    info!("Using IP geolocation from {}", url);
    Ok(Arc::new(loctrack_core::IpGeolocationProvider::new(url)?))
}

#[cfg(not(feature = "http"))]
fn ip_provider(_url: &str) -> Result<Arc<dyn PositionProvider>> {
    Err(Error::InvalidConfig(
        "IP geolocation requires the `http` feature".to_string(),
    ))
}

/// Address resolver selected by `[geocoder]`.
pub fn build_resolver(config: &GeocoderConfig) -> Result<Arc<dyn AddressResolver>> {
    match config.kind {
        GeocoderKind::Offline => {
            info!("Reverse geocoding disabled");
            Ok(Arc::new(OfflineResolver))
        }
        GeocoderKind::Nominatim => nominatim_resolver(config),
    }
}

#[cfg(feature = "http")]
fn nominatim_resolver(config: &GeocoderConfig) -> Result<Arc<dyn AddressResolver>> {
    info!("Using Nominatim at {}", config.url);
    let mut resolver = loctrack_core::NominatimResolver::new(&config.url, &config.user_agent)?;
    if let Some(language) = &config.language {
        resolver = resolver.with_language(language.clone());
    }
    Ok(Arc::new(resolver))
}

#[cfg(not(feature = "http"))]
fn nominatim_resolver(_config: &GeocoderConfig) -> Result<Arc<dyn AddressResolver>> {
    Err(Error::InvalidConfig(
        "Nominatim geocoding requires the `http` feature".to_string(),
    ))
}

/// Permission gate seeded from `[permission]`.
pub fn build_permission(config: &PermissionConfig) -> Arc<PermissionSwitch> {
    Arc::new(PermissionSwitch::new(config.location_granted))
}
