//! Weather widget: location, condition icon, temperature and condition text.
//!
//! Data comes from the weather [`DataCache`], keyed by widget id. A missing or
//! stale entry starts a background fetch; the frame paints whatever entry
//! exists at that moment.

use std::sync::Arc;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Rectangle};
use log::debug;

use super::fonts::{BODY_BOLD_FONT, LABEL_FONT};
use super::palette::{
    WEATHER_CLOUDY, WEATHER_DEFAULT, WEATHER_RAIN, WEATHER_SNOW, WEATHER_STORM, WEATHER_SUNNY,
};
use super::{WidgetRenderer, draw_line_of_text};
use crate::cache::DataCache;
use crate::fetch::{WeatherData, WeatherFetcher};
use crate::time::TimeSource;
use crate::widget::{WeatherConfig, Widget, WidgetId};

/// Weather payloads keyed by widget id.
pub type WeatherCache = DataCache<WidgetId, WeatherData>;

/// Baseline of the location label below the widget anchor
pub const LOCATION_LINE_OFFSET_PX: i32 = 12;

/// Baseline of the icon and temperature line below the widget anchor
pub const TEMPERATURE_LINE_OFFSET_PX: i32 = 25;

/// Baseline of the condition line below the widget anchor
pub const CONDITION_LINE_OFFSET_PX: i32 = 38;

/// Side of the square icon cell, in pixels
const ICON_SIZE_PX: u32 = 10;

/// Horizontal gap between the icon cell and the temperature
const ICON_GAP_PX: i32 = 3;

// ============================================================================
// Condition classification
// ============================================================================

/// Icon chosen by keyword match on a condition string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherIcon {
    Sunny,
    Cloudy,
    Rain,
    Snow,
    Storm,
    Fog,
    /// Anything that matches no keyword
    PartlyCloudy,
}

impl WeatherIcon {
    /// First matching keyword wins, case-insensitively, in the order
    /// sunny/clear, cloud, rain, snow, thunder/storm, fog/mist.
    pub fn from_condition(condition: &str) -> Self {
        let condition = condition.to_lowercase();
        let has = |needle: &str| condition.contains(needle);

        if has("sunny") || has("clear") {
            WeatherIcon::Sunny
        } else if has("cloud") {
            WeatherIcon::Cloudy
        } else if has("rain") {
            WeatherIcon::Rain
        } else if has("snow") {
            WeatherIcon::Snow
        } else if has("thunder") || has("storm") {
            WeatherIcon::Storm
        } else if has("fog") || has("mist") {
            WeatherIcon::Fog
        } else {
            WeatherIcon::PartlyCloudy
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            WeatherIcon::Sunny => "☀️",
            WeatherIcon::Cloudy => "☁️",
            WeatherIcon::Rain => "🌧️",
            WeatherIcon::Snow => "❄️",
            WeatherIcon::Storm => "⛈️",
            WeatherIcon::Fog => "🌫️",
            WeatherIcon::PartlyCloudy => "🌤️",
        }
    }

    /// Text color for the widget. Fog has no color of its own.
    pub fn text_color(&self) -> Rgb565 {
        match self {
            WeatherIcon::Sunny => WEATHER_SUNNY,
            WeatherIcon::Cloudy => WEATHER_CLOUDY,
            WeatherIcon::Rain => WEATHER_RAIN,
            WeatherIcon::Snow => WEATHER_SNOW,
            WeatherIcon::Storm => WEATHER_STORM,
            WeatherIcon::Fog | WeatherIcon::PartlyCloudy => WEATHER_DEFAULT,
        }
    }
}

// ============================================================================
// Icon glyphs
// ============================================================================

fn draw_cloud<D: DrawTarget<Color = Rgb565>>(origin: Point, display: &mut D) -> Result<(), D::Error> {
    let style = PrimitiveStyle::with_fill(WEATHER_CLOUDY);
    Circle::new(origin + Point::new(1, 1), 5).into_styled(style).draw(display)?;
    Circle::new(origin + Point::new(4, 0), 6).into_styled(style).draw(display)?;
    Rectangle::new(origin + Point::new(1, 4), Size::new(9, 3))
        .into_styled(style)
        .draw(display)?;
    Ok(())
}

/// Draw `icon` inside the 10x10 cell whose top-left corner is `origin`.
pub fn draw_icon<D: DrawTarget<Color = Rgb565>>(
    icon: WeatherIcon,
    origin: Point,
    display: &mut D,
) -> Result<(), D::Error> {
    match icon {
        WeatherIcon::Sunny => {
            Circle::new(origin + Point::new(2, 2), 6)
                .into_styled(PrimitiveStyle::with_fill(WEATHER_SUNNY))
                .draw(display)?;
            let rays = PrimitiveStyle::with_stroke(WEATHER_SUNNY, 1);
            Line::new(origin + Point::new(5, 0), origin + Point::new(5, 9))
                .into_styled(rays)
                .draw(display)?;
            Line::new(origin + Point::new(0, 5), origin + Point::new(9, 5))
                .into_styled(rays)
                .draw(display)?;
        }
        WeatherIcon::Cloudy => draw_cloud(origin, display)?,
        WeatherIcon::Rain => {
            draw_cloud(origin, display)?;
            let drops = PrimitiveStyle::with_stroke(WEATHER_RAIN, 1);
            for x in [2, 5, 8] {
                Line::new(origin + Point::new(x, 8), origin + Point::new(x - 1, 9))
                    .into_styled(drops)
                    .draw(display)?;
            }
        }
        WeatherIcon::Snow => {
            let flake = PrimitiveStyle::with_stroke(WEATHER_SNOW, 1);
            let c = origin + Point::new(5, 5);
            for (dx, dy) in [(4, 0), (0, 4), (3, 3), (3, -3)] {
                Line::new(c - Point::new(dx, dy), c + Point::new(dx, dy))
                    .into_styled(flake)
                    .draw(display)?;
            }
        }
        WeatherIcon::Storm => {
            draw_cloud(origin, display)?;
            let bolt = PrimitiveStyle::with_stroke(WEATHER_SUNNY, 1);
            Line::new(origin + Point::new(6, 6), origin + Point::new(4, 8))
                .into_styled(bolt)
                .draw(display)?;
            Line::new(origin + Point::new(4, 8), origin + Point::new(6, 9))
                .into_styled(bolt)
                .draw(display)?;
        }
        WeatherIcon::Fog => {
            let haze = PrimitiveStyle::with_stroke(WEATHER_CLOUDY, 1);
            for y in [2, 5, 8] {
                Line::new(origin + Point::new(0, y), origin + Point::new(9, y))
                    .into_styled(haze)
                    .draw(display)?;
            }
        }
        WeatherIcon::PartlyCloudy => {
            Circle::new(origin + Point::new(4, 0), 6)
                .into_styled(PrimitiveStyle::with_fill(WEATHER_SUNNY))
                .draw(display)?;
            let style = PrimitiveStyle::with_fill(WEATHER_CLOUDY);
            Circle::new(origin + Point::new(0, 4), 5).into_styled(style).draw(display)?;
            Rectangle::new(origin + Point::new(2, 6), Size::new(7, 3))
                .into_styled(style)
                .draw(display)?;
        }
    }
    Ok(())
}

// ============================================================================
// Renderer
// ============================================================================

pub struct WeatherRenderer {
    cache: WeatherCache,
    fetcher: Arc<dyn WeatherFetcher>,
    time: Arc<dyn TimeSource>,
}

impl WeatherRenderer {
    pub fn new(
        cache: WeatherCache,
        fetcher: Arc<dyn WeatherFetcher>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            cache,
            fetcher,
            time,
        }
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }

    /// Start a background fetch for `widget` if its entry is absent or
    /// stale and none is outstanding. Returns whether a fetch was started.
    pub fn ensure_fresh(&self, widget: &Widget, config: &WeatherConfig) -> bool {
        if !self
            .cache
            .begin_fetch(&widget.id, self.time.now(), WeatherData::placeholder())
        {
            return false;
        }

        debug!("Fetching weather for widget {} ({})", widget.id, config.location);
        let key = widget.id.clone();
        let config = config.clone();
        let cache = self.cache.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let time = Arc::clone(&self.time);

        tokio::spawn(async move {
            let data = fetcher.fetch(&config).await;
            debug!(
                "Weather for widget {} settled: {} {}",
                key,
                WeatherIcon::from_condition(&data.condition).emoji(),
                data.condition
            );
            cache.resolve(key, data, time.now());
        });
        true
    }
}

impl WidgetRenderer for WeatherRenderer {
    type Config = WeatherConfig;

    async fn render<D: DrawTarget<Color = Rgb565>>(
        &self,
        widget: &Widget,
        config: &WeatherConfig,
        display: &mut D,
    ) -> Result<(), D::Error> {
        self.ensure_fresh(widget, config);

        let data = self
            .cache
            .get(&widget.id)
            .map(|entry| entry.payload)
            .unwrap_or_else(WeatherData::placeholder);

        let icon = WeatherIcon::from_condition(&data.condition);
        let color = icon.text_color();
        let anchor = widget.anchor();

        draw_line_of_text(
            &data.location,
            anchor + Point::new(0, LOCATION_LINE_OFFSET_PX),
            LABEL_FONT,
            color,
            display,
        )?;

        let icon_top = TEMPERATURE_LINE_OFFSET_PX - ICON_SIZE_PX as i32;
        draw_icon(icon, anchor + Point::new(0, icon_top), display)?;

        let temperature = format!("{}°{}", data.temp, config.unit.symbol());
        draw_line_of_text(
            &temperature,
            anchor + Point::new(ICON_SIZE_PX as i32 + ICON_GAP_PX, TEMPERATURE_LINE_OFFSET_PX),
            BODY_BOLD_FONT,
            color,
            display,
        )?;

        draw_line_of_text(
            &data.condition,
            anchor + Point::new(0, CONDITION_LINE_OFFSET_PX),
            BODY_BOLD_FONT,
            color,
            display,
        )
    }
}
