//! Runtime configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working setup pointed at the public endpoints.
//!
//! ```toml
//! [display]
//! width = 320
//! height = 160
//!
//! [stock]
//! api_key = "demo"
//!
//! [geolocation]
//! provider = "fixed"
//! latitude = 18.52
//! longitude = 73.85
//!
//! [[widgets]]
//! id = "clock"
//! type = "clock"
//! x = 10
//! y = 40
//! width = 100
//! height = 50
//! config = { format = "12h" }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use embedded_graphics::prelude::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::{STOCK_TTL, WEATHER_TTL};
use crate::widget::Widget;

/// Environment variable overriding `stock.api_key`
pub const STOCK_API_KEY_ENV: &str = "GLOWGRID_STOCK_API_KEY";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlowGridConfig {
    pub display: DisplayConfig,
    pub http: HttpConfig,
    pub weather: WeatherSourceConfig,
    pub stock: StockSourceConfig,
    pub geolocation: GeolocationConfig,
    /// Initial widget layout.
    pub widgets: Vec<Widget>,
}

impl GlowGridConfig {
    /// Read and parse a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Replace secrets with values from the process environment, if set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(STOCK_API_KEY_ENV)
            && !key.is_empty()
        {
            self.stock.api_key = key;
        }
    }
}

/// Simulated LED matrix surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Surface width in pixels
    pub width: u32,
    /// Surface height in pixels
    pub height: u32,
    /// Spacing of the LED grid overlay in pixels
    pub grid_pitch: u32,
}

impl DisplayConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl Default for DisplayConfig {
    /// 64x32 LED matrix at 5x scale
    fn default() -> Self {
        Self {
            width: 320,
            height: 160,
            grid_pitch: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout applied by the HTTP client
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("glowgrid/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSourceConfig {
    pub base_url: String,
    pub ttl_secs: i64,
}

impl WeatherSourceConfig {
    pub fn ttl(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.ttl_secs).unwrap_or(WEATHER_TTL)
    }
}

impl Default for WeatherSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wttr.in".to_owned(),
            ttl_secs: WEATHER_TTL.num_seconds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockSourceConfig {
    pub base_url: String,
    pub api_key: String,
    /// Market suffix appended to every ticker (`TCS` -> `TCS.BSE`)
    pub exchange_suffix: String,
    pub ttl_secs: i64,
}

impl StockSourceConfig {
    pub fn ttl(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.ttl_secs).unwrap_or(STOCK_TTL)
    }
}

impl Default for StockSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.alphavantage.co".to_owned(),
            api_key: "demo".to_owned(),
            exchange_suffix: "BSE".to_owned(),
            ttl_secs: STOCK_TTL.num_seconds(),
        }
    }
}

/// How the "Current Location" sentinel is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum GeolocationConfig {
    /// Look up the public IP's location over HTTP
    Ip {
        #[serde(default = "default_ip_geolocation_url")]
        url: String,
    },
    /// Always report the given coordinates
    Fixed { latitude: f64, longitude: f64 },
    /// No geolocation; the sentinel always falls back
    Disabled,
}

fn default_ip_geolocation_url() -> String {
    "http://ip-api.com/json".to_owned()
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        GeolocationConfig::Ip {
            url: default_ip_geolocation_url(),
        }
    }
}
