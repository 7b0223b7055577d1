//! Weather fetcher backed by the wttr.in JSON API (`format=j1`).

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use serde_json::Value;

use super::geolocation::{Coordinates, Geolocator};
use super::{FetchError, get_json};
use crate::config::WeatherSourceConfig;
use crate::widget::{TemperatureUnit, WeatherConfig};

/// Temperature reported when a fetch fails
pub const FALLBACK_TEMPERATURE: i32 = 22;

/// Condition text reported when a fetch fails
pub const FALLBACK_CONDITION: &str = "Error fetching weather";

/// Location label used when the sentinel could not be resolved
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Weather payload painted by the weather widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherData {
    /// Temperature in the widget's configured unit
    pub temp: i32,
    pub condition: String,
    /// Display label for the location
    pub location: String,
}

impl WeatherData {
    /// Payload shown while the first fetch for a key is outstanding.
    pub fn placeholder() -> Self {
        Self {
            temp: 0,
            condition: "Loading...".to_owned(),
            location: "Fetching...".to_owned(),
        }
    }

    /// Payload substituted for any failed fetch.
    pub fn fallback(config: &WeatherConfig) -> Self {
        let location = if config.is_current_location() {
            UNKNOWN_LOCATION.to_owned()
        } else {
            config.location.clone()
        };
        Self {
            temp: FALLBACK_TEMPERATURE,
            condition: FALLBACK_CONDITION.to_owned(),
            location,
        }
    }
}

/// Produces weather for a widget configuration. Never fails.
#[async_trait]
pub trait WeatherFetcher: Send + Sync {
    async fn fetch(&self, config: &WeatherConfig) -> WeatherData;
}

/// Convert whole degrees Celsius to the nearest whole degree Fahrenheit.
pub fn celsius_to_fahrenheit(celsius: i32) -> i32 {
    (celsius as f64 * 9.0 / 5.0 + 32.0).round() as i32
}

/// HTTP weather fetcher with geolocation for the sentinel location.
pub struct HttpWeatherFetcher {
    client: reqwest::Client,
    base_url: String,
    geolocator: Arc<dyn Geolocator>,
}

impl HttpWeatherFetcher {
    pub fn new(
        client: reqwest::Client,
        config: &WeatherSourceConfig,
        geolocator: Arc<dyn Geolocator>,
    ) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            geolocator,
        }
    }

    /// `{base}/{target}?format=j1`, with `target` encoded as one path segment.
    fn request_url(&self, target: &str) -> Result<reqwest::Url, FetchError> {
        let invalid = || FetchError::InvalidUrl(self.base_url.clone());
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push(target);
        url.query_pairs_mut().append_pair("format", "j1");
        Ok(url)
    }

    async fn try_fetch(&self, config: &WeatherConfig) -> Result<WeatherData, FetchError> {
        let target = if config.is_current_location() {
            let coords: Coordinates = self.geolocator.locate().await?;
            coords.to_string()
        } else {
            config.location.clone()
        };

        let body = get_json(&self.client, self.request_url(&target)?).await?;
        parse_report(&body, config)
    }
}

#[async_trait]
impl WeatherFetcher for HttpWeatherFetcher {
    async fn fetch(&self, config: &WeatherConfig) -> WeatherData {
        match self.try_fetch(config).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to fetch weather for {:?}: {}", config.location, e);
                WeatherData::fallback(config)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

fn first_value<'a>(node: &'a Value, field: &str) -> Option<&'a str> {
    node[field][0]["value"].as_str()
}

/// Integer-prefix parse: `"21"` -> 21, `"21.8"` -> 21.
fn parse_whole_degrees(value: &Value) -> Option<i32> {
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }
    let text = value.as_str()?.trim();
    text.parse::<i32>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().map(|f| f.trunc() as i32))
}

/// Extract a [`WeatherData`] from a `format=j1` body.
pub fn parse_report(body: &Value, config: &WeatherConfig) -> Result<WeatherData, FetchError> {
    let current = &body["current_condition"][0];

    let celsius =
        parse_whole_degrees(&current["temp_C"]).ok_or(FetchError::MissingField("temp_C"))?;
    let temp = match config.unit {
        TemperatureUnit::C => celsius,
        TemperatureUnit::F => celsius_to_fahrenheit(celsius),
    };

    let condition = first_value(current, "weatherDesc")
        .ok_or(FetchError::MissingField("weatherDesc"))?
        .to_owned();

    let location = if config.is_current_location() {
        resolved_location_label(&body["nearest_area"][0])?
    } else {
        config.location.clone()
    };

    Ok(WeatherData {
        temp,
        condition,
        location,
    })
}

/// `"{area}, {region}"`, or `"{lat}, {lon}"` when the area is unknown.
fn resolved_location_label(area: &Value) -> Result<String, FetchError> {
    let name = first_value(area, "areaName").ok_or(FetchError::MissingField("areaName"))?;
    if name != UNKNOWN_LOCATION {
        let region = first_value(area, "region").ok_or(FetchError::MissingField("region"))?;
        return Ok(format!("{}, {}", name, region));
    }

    let lat = first_value(area, "latitude").ok_or(FetchError::MissingField("latitude"))?;
    let lon = first_value(area, "longitude").ok_or(FetchError::MissingField("longitude"))?;
    Ok(format!("{}, {}", lat, lon))
}
