//! Device location lookup for the "Current Location" weather sentinel.

use std::sync::Arc;

use async_trait::async_trait;
use core::fmt;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GeolocationConfig;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Error)]
pub enum GeolocationError {
    /// No provider configured
    #[error("geolocation unavailable")]
    Unavailable,

    /// Lookup request failed
    #[error("lookup failed: {0}")]
    Lookup(#[from] reqwest::Error),

    /// Provider answered without usable coordinates
    #[error("provider returned no coordinates")]
    NoCoordinates,
}

/// Resolves the device position.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// Always fails; the weather fetcher then uses its fallback payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeolocator;

#[async_trait]
impl Geolocator for DisabledGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unavailable)
    }
}

/// Reports a configured position.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// IP-based lookup (`{"lat": .., "lon": ..}` JSON).
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl IpGeolocator {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        log::debug!("Resolving location via {}", self.url);

        let resp: IpLookupResponse = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match (resp.lat, resp.lon) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates {
                latitude,
                longitude,
            }),
            _ => Err(GeolocationError::NoCoordinates),
        }
    }
}

/// Build the geolocator selected by configuration.
pub fn geolocator_from_config(
    config: &GeolocationConfig,
    client: reqwest::Client,
) -> Arc<dyn Geolocator> {
    match config {
        GeolocationConfig::Ip { url } => Arc::new(IpGeolocator::new(client, url.clone())),
        GeolocationConfig::Fixed {
            latitude,
            longitude,
        } => Arc::new(FixedGeolocator(Coordinates {
            latitude: *latitude,
            longitude: *longitude,
        })),
        GeolocationConfig::Disabled => Arc::new(DisabledGeolocator),
    }
}
