//! Remote data fetchers for data-backed widgets.
//!
//! Every fetcher fails soft: its public `fetch` always returns a payload.
//! HTTP implementations run a fallible request internally and turn any
//! [`FetchError`] into a synthetic fallback payload plus a `warn!` log, so a
//! data-source failure never reaches the render pipeline.

pub mod geolocation;
pub mod stock;
pub mod weather;

use thiserror::Error;

use crate::config::HttpConfig;

pub use geolocation::{
    Coordinates, DisabledGeolocator, FixedGeolocator, GeolocationError, Geolocator, IpGeolocator,
    geolocator_from_config,
};
pub use stock::{HttpStockFetcher, PriceHistory, StockData, StockFetcher};
pub use weather::{HttpWeatherFetcher, WeatherData, WeatherFetcher};

/// Error types for a single remote request
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (connect, timeout, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configured base URL cannot carry the request
    #[error("invalid endpoint URL {0}")]
    InvalidUrl(String),

    /// Endpoint answered with a non-success status
    #[error("unexpected status {0}")]
    Status(u16),

    /// Body was not the expected JSON
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A required field was absent or unparseable
    #[error("missing field {0}")]
    MissingField(&'static str),

    /// Quote endpoint returned no usable quote
    #[error("no quote in response")]
    NoQuote,

    /// Device location could not be resolved
    #[error("geolocation failed: {0}")]
    Geolocation(#[from] GeolocationError),
}

/// Build the HTTP client shared by the fetchers.
pub fn build_http_client(config: &HttpConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .pool_max_idle_per_host(4)
        .timeout(config.timeout())
        .build()
        .expect("failed to build GlowGrid HTTP client")
}

/// GET `url` and decode the body as JSON, mapping status and decode failures.
pub(crate) async fn get_json(
    client: &reqwest::Client,
    url: reqwest::Url,
) -> Result<serde_json::Value, FetchError> {
    log::debug!("GET {}", url);

    let resp = client.get(url).send().await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = resp.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
