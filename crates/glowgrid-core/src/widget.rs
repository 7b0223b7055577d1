//! Widget record shared by every widget kind.
//!
//! A [`Widget`] is a positioned box on the display surface plus a
//! kind-specific [`WidgetConfig`]. The kind is derived from the config
//! variant, so a record can never carry a config of the wrong shape.
//!
//! The serde form mirrors the record exchanged with the editing UI:
//!
//! ```json
//! { "id": "1712", "type": "stock", "x": 10, "y": 80,
//!   "width": 120, "height": 80, "config": { "symbol": "TCS" } }
//! ```

use core::fmt;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use serde::{Deserialize, Serialize};

/// Weather location sentinel meaning "resolve via geolocation at fetch time".
pub const CURRENT_LOCATION: &str = "Current Location";

/// Default widget box width in pixels
pub const DEFAULT_WIDGET_WIDTH_PX: u32 = 100;

/// Default widget box height in pixels
pub const DEFAULT_WIDGET_HEIGHT_PX: u32 = 50;

/// Stock widgets get a larger box to fit the sparkline
pub const STOCK_WIDGET_WIDTH_PX: u32 = 120;

/// Stock widget box height in pixels
pub const STOCK_WIDGET_HEIGHT_PX: u32 = 80;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Caller-assigned widget identity, unique within the active board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WidgetId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for WidgetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Kind-specific configuration
// ---------------------------------------------------------------------------

/// The closed set of widget kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Clock,
    Weather,
    Text,
    Stock,
}

impl WidgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Clock => "clock",
            WidgetKind::Weather => "weather",
            WidgetKind::Text => "text",
            WidgetKind::Stock => "stock",
        }
    }

    /// Position used when a widget of this kind is added without one.
    pub fn default_position(&self) -> Point {
        match self {
            WidgetKind::Text => Point::new(160, 10),
            WidgetKind::Clock => Point::new(10, 40),
            WidgetKind::Weather => Point::new(190, 120),
            WidgetKind::Stock => Point::new(10, 80),
        }
    }

    pub fn default_size(&self) -> Size {
        match self {
            WidgetKind::Stock => Size::new(STOCK_WIDGET_WIDTH_PX, STOCK_WIDGET_HEIGHT_PX),
            _ => Size::new(DEFAULT_WIDGET_WIDTH_PX, DEFAULT_WIDGET_HEIGHT_PX),
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hour display of the clock widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClockFormat {
    #[serde(rename = "12h")]
    TwelveHour,
    #[default]
    #[serde(rename = "24h")]
    TwentyFourHour,
}

impl ClockFormat {
    pub fn toggled(self) -> Self {
        match self {
            ClockFormat::TwelveHour => ClockFormat::TwentyFourHour,
            ClockFormat::TwentyFourHour => ClockFormat::TwelveHour,
        }
    }
}

/// Temperature unit shown by the weather widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    C,
    F,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::C => "C",
            TemperatureUnit::F => "F",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TemperatureUnit::C => TemperatureUnit::F,
            TemperatureUnit::F => TemperatureUnit::C,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClockConfig {
    pub format: ClockFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub location: String,
    pub unit: TemperatureUnit,
}

impl WeatherConfig {
    /// Whether the location must be resolved through geolocation.
    pub fn is_current_location(&self) -> bool {
        self.location == CURRENT_LOCATION
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            location: CURRENT_LOCATION.to_owned(),
            unit: TemperatureUnit::C,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextConfig {
    pub text: String,
    #[serde(rename = "fontSize")]
    pub font_size: u32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            text: "Hello World".to_owned(),
            font_size: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockConfig {
    pub symbol: String,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            symbol: STOCK_CATALOG[0].symbol.to_owned(),
        }
    }
}

/// Kind-tagged widget configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum WidgetConfig {
    Clock(ClockConfig),
    Weather(WeatherConfig),
    Text(TextConfig),
    Stock(StockConfig),
}

impl WidgetConfig {
    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetConfig::Clock(_) => WidgetKind::Clock,
            WidgetConfig::Weather(_) => WidgetKind::Weather,
            WidgetConfig::Text(_) => WidgetKind::Text,
            WidgetConfig::Stock(_) => WidgetKind::Stock,
        }
    }

    /// Default configuration offered for a fresh widget of `kind`.
    pub fn default_for(kind: WidgetKind) -> Self {
        match kind {
            WidgetKind::Clock => WidgetConfig::Clock(ClockConfig::default()),
            WidgetKind::Weather => WidgetConfig::Weather(WeatherConfig::default()),
            WidgetKind::Text => WidgetConfig::Text(TextConfig::default()),
            WidgetKind::Stock => WidgetConfig::Stock(StockConfig::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Widget record
// ---------------------------------------------------------------------------

/// A positioned widget on the display surface.
///
/// Coordinates are surface pixels with the origin at the top-left corner.
/// Records are replaced whole on update; nothing mutates one in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    pub id: WidgetId,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub config: WidgetConfig,
}

impl Widget {
    pub fn new(
        id: impl Into<WidgetId>,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        config: WidgetConfig,
    ) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            config,
        }
    }

    /// Create a widget at the default position and size for its kind.
    pub fn placed(id: impl Into<WidgetId>, config: WidgetConfig) -> Self {
        let kind = config.kind();
        let position = kind.default_position();
        let size = kind.default_size();
        Self::new(id, position.x, position.y, size.width, size.height, config)
    }

    pub fn kind(&self) -> WidgetKind {
        self.config.kind()
    }

    /// Anchor point the renderers offset their text lines from.
    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(self.anchor(), Size::new(self.width, self.height))
    }

    /// Whether `point` lies inside the box, edges included.
    pub fn contains(&self, point: Point) -> bool {
        // i64 holds every i32 + u32 sum.
        let (px, py) = (i64::from(point.x), i64::from(point.y));
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        px >= x
            && px <= x + i64::from(self.width)
            && py >= y
            && py <= y + i64::from(self.height)
    }

    /// Same id and placement, new configuration.
    pub fn with_config(&self, config: WidgetConfig) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Stock catalog
// ---------------------------------------------------------------------------

/// Market capitalisation group of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapTier {
    Large,
    Mid,
    Other,
}

impl fmt::Display for CapTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CapTier::Large => "large cap",
            CapTier::Mid => "mid cap",
            CapTier::Other => "other",
        })
    }
}

/// A ticker offered by the editing UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub symbol: &'static str,
    pub name: &'static str,
    pub tier: CapTier,
}

/// Tickers offered for stock widgets.
///
/// Advisory only: a symbol outside the catalog is fetched like any other.
pub const STOCK_CATALOG: &[CatalogEntry] = &[
    CatalogEntry { symbol: "RELIANCE", name: "Reliance Industries", tier: CapTier::Large },
    CatalogEntry { symbol: "TCS", name: "Tata Consultancy Services", tier: CapTier::Large },
    CatalogEntry { symbol: "INFY", name: "Infosys", tier: CapTier::Large },
    CatalogEntry { symbol: "HDFCBANK", name: "HDFC Bank", tier: CapTier::Large },
    CatalogEntry { symbol: "ICICIBANK", name: "ICICI Bank", tier: CapTier::Large },
    CatalogEntry { symbol: "WIPRO", name: "Wipro", tier: CapTier::Mid },
    CatalogEntry { symbol: "LT", name: "Larsen & Toubro", tier: CapTier::Mid },
    CatalogEntry { symbol: "SBIN", name: "State Bank of India", tier: CapTier::Mid },
    CatalogEntry { symbol: "BAJAJ-AUTO", name: "Bajaj Auto", tier: CapTier::Mid },
    CatalogEntry { symbol: "MARUTI", name: "Maruti Suzuki", tier: CapTier::Mid },
    CatalogEntry { symbol: "ITC", name: "ITC", tier: CapTier::Other },
    CatalogEntry { symbol: "TATASTEEL", name: "Tata Steel", tier: CapTier::Other },
    CatalogEntry { symbol: "POWERGRID", name: "Power Grid", tier: CapTier::Other },
];

/// Catalog entry for `symbol`, matched case-insensitively.
pub fn catalog_entry(symbol: &str) -> Option<&'static CatalogEntry> {
    STOCK_CATALOG
        .iter()
        .find(|entry| entry.symbol.eq_ignore_ascii_case(symbol))
}

/// The catalog symbol following `current`, wrapping around.
///
/// Unknown symbols restart at the first entry.
pub fn next_catalog_symbol(current: &str) -> &'static str {
    let position = STOCK_CATALOG
        .iter()
        .position(|entry| entry.symbol.eq_ignore_ascii_case(current));
    match position {
        Some(i) => STOCK_CATALOG[(i + 1) % STOCK_CATALOG.len()].symbol,
        None => STOCK_CATALOG[0].symbol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_record_shape() {
        let json = r#"{
            "id": "1712",
            "type": "weather",
            "x": 190,
            "y": 120,
            "width": 100,
            "height": 50,
            "config": { "location": "Pune", "unit": "F" }
        }"#;

        let widget: Widget = serde_json::from_str(json).expect("record should deserialize");

        assert_eq!(widget.id.as_str(), "1712");
        assert_eq!(widget.kind(), WidgetKind::Weather);
        assert_eq!(
            widget.config,
            WidgetConfig::Weather(WeatherConfig {
                location: "Pune".into(),
                unit: TemperatureUnit::F,
            })
        );
    }

    #[test]
    fn test_serialize_uses_external_field_names() {
        let widget = Widget::placed(
            "t1",
            WidgetConfig::Text(TextConfig {
                text: "Hi".into(),
                font_size: 12,
            }),
        );
        let value = serde_json::to_value(&widget).unwrap();

        assert_eq!(value["type"], "text");
        assert_eq!(value["config"]["fontSize"], 12);
        assert_eq!(value["x"], 160);

        let clock = Widget::placed("c1", WidgetConfig::Clock(ClockConfig::default()));
        let value = serde_json::to_value(&clock).unwrap();
        assert_eq!(value["config"]["format"], "24h");
    }

    #[test]
    fn test_default_placement_per_kind() {
        let stock = Widget::placed("s", WidgetConfig::default_for(WidgetKind::Stock));
        assert_eq!((stock.x, stock.y, stock.width, stock.height), (10, 80, 120, 80));

        let clock = Widget::placed("c", WidgetConfig::default_for(WidgetKind::Clock));
        assert_eq!((clock.x, clock.y, clock.width, clock.height), (10, 40, 100, 50));

        let weather = Widget::placed("w", WidgetConfig::default_for(WidgetKind::Weather));
        assert_eq!((weather.x, weather.y), (190, 120));
    }

    #[test]
    fn test_contains_is_edge_inclusive() {
        let widget = Widget::new("a", 10, 10, 20, 10, WidgetConfig::default_for(WidgetKind::Text));

        assert!(widget.contains(Point::new(10, 10)));
        assert!(widget.contains(Point::new(30, 20)));
        assert!(!widget.contains(Point::new(31, 20)));
        assert!(!widget.contains(Point::new(9, 15)));
    }

    #[test]
    fn test_next_catalog_symbol_wraps() {
        assert_eq!(next_catalog_symbol("RELIANCE"), "TCS");
        assert_eq!(next_catalog_symbol("powergrid"), "RELIANCE");
        assert_eq!(next_catalog_symbol("NOTLISTED"), "RELIANCE");
    }

    #[test]
    fn test_catalog_entry_lookup() {
        let tcs = catalog_entry("tcs").unwrap();
        assert_eq!(tcs.name, "Tata Consultancy Services");
        assert_eq!(tcs.tier.to_string(), "large cap");
        assert_eq!(catalog_entry("WIPRO").map(|e| e.tier), Some(CapTier::Mid));
        assert!(catalog_entry("NOTLISTED").is_none());
    }

    #[test]
    fn test_weather_sentinel() {
        assert!(WeatherConfig::default().is_current_location());
        let pune = WeatherConfig {
            location: "Pune".into(),
            unit: TemperatureUnit::C,
        };
        assert!(!pune.is_current_location());
    }
}
