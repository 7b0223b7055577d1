//! Frame rendering for the widget board.
//!
//! [`RenderPipeline::render_frame`] paints one complete frame:
//!
//! 1. Clear the surface to the unlit LED color
//! 2. Draw the LED grid overlay
//! 3. Render each widget in board order, awaiting each before the next
//! 4. Outline the selected widget, if any
//!
//! Widgets are rendered strictly in sequence so cache writes within one pass
//! happen in board order.

use std::sync::Arc;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle};
use log::{debug, trace};

use crate::board::WidgetBoard;
use crate::cache::DataCache;
use crate::config::{DisplayConfig, GlowGridConfig};
use crate::fetch::{
    HttpStockFetcher, HttpWeatherFetcher, StockFetcher, WeatherFetcher, build_http_client,
    geolocator_from_config,
};
use crate::render::palette::{GRID_LINE, LED_OFF, SELECTION};
use crate::render::{
    ClockRenderer, StockCache, StockRenderer, TextRenderer, WeatherCache, WeatherRenderer,
    WidgetRenderer,
};
use crate::time::TimeSource;
use crate::widget::{Widget, WidgetConfig};

/// Stroke width of the selection outline
pub const SELECTION_STROKE_PX: u32 = 2;

/// Distance between the selection outline and the widget bounds
pub const SELECTION_MARGIN_PX: u32 = 2;

/// Owns one renderer per widget kind and the two data caches.
pub struct RenderPipeline {
    display: DisplayConfig,
    clock: ClockRenderer,
    text: TextRenderer,
    weather: WeatherRenderer,
    stock: StockRenderer,
}

impl RenderPipeline {
    /// Build a pipeline with fresh, empty caches using the TTLs from `config`.
    pub fn new(
        config: &GlowGridConfig,
        time: Arc<dyn TimeSource>,
        weather_fetcher: Arc<dyn WeatherFetcher>,
        stock_fetcher: Arc<dyn StockFetcher>,
    ) -> Self {
        let weather_cache = DataCache::new(config.weather.ttl());
        let stock_cache = DataCache::new(config.stock.ttl());

        Self {
            display: config.display,
            clock: ClockRenderer::new(Arc::clone(&time)),
            text: TextRenderer,
            weather: WeatherRenderer::new(weather_cache, weather_fetcher, Arc::clone(&time)),
            stock: StockRenderer::new(stock_cache, stock_fetcher, time),
        }
    }

    /// Build a pipeline backed by the HTTP fetchers described in `config`.
    pub fn from_config(config: &GlowGridConfig, time: Arc<dyn TimeSource>) -> Self {
        let client = build_http_client(&config.http);
        let geolocator = geolocator_from_config(&config.geolocation, client.clone());
        let weather = HttpWeatherFetcher::new(client.clone(), &config.weather, geolocator);
        let stock = HttpStockFetcher::new(client, &config.stock);

        Self::new(config, time, Arc::new(weather), Arc::new(stock))
    }

    pub fn weather_cache(&self) -> &WeatherCache {
        self.weather.cache()
    }

    pub fn stock_cache(&self) -> &StockCache {
        self.stock.cache()
    }

    /// Paint one full frame of `board` into `display`.
    pub async fn render_frame<D: DrawTarget<Color = Rgb565>>(
        &self,
        board: &WidgetBoard,
        display: &mut D,
    ) -> Result<(), D::Error> {
        debug!("Rendering frame with {} widgets", board.len());

        display.clear(LED_OFF)?;
        self.draw_grid(display)?;

        for widget in board.widgets() {
            self.render_widget(widget, display).await?;
        }

        if let Some(selected) = board.selected_widget() {
            draw_selection(selected, display)?;
        }

        Ok(())
    }

    /// Dispatch `widget` to the renderer for its kind.
    pub async fn render_widget<D: DrawTarget<Color = Rgb565>>(
        &self,
        widget: &Widget,
        display: &mut D,
    ) -> Result<(), D::Error> {
        trace!("Rendering {} widget {}", widget.kind(), widget.id);

        match &widget.config {
            WidgetConfig::Clock(config) => self.clock.render(widget, config, display).await,
            WidgetConfig::Weather(config) => self.weather.render(widget, config, display).await,
            WidgetConfig::Text(config) => self.text.render(widget, config, display).await,
            WidgetConfig::Stock(config) => self.stock.render(widget, config, display).await,
        }
    }

    fn draw_grid<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        let pitch = self.display.grid_pitch;
        if pitch == 0 {
            return Ok(());
        }

        let style = PrimitiveStyle::with_stroke(GRID_LINE, 1);
        let right = self.display.width as i32 - 1;
        let bottom = self.display.height as i32 - 1;

        for x in (0..self.display.width).step_by(pitch as usize) {
            Line::new(Point::new(x as i32, 0), Point::new(x as i32, bottom))
                .into_styled(style)
                .draw(display)?;
        }
        for y in (0..self.display.height).step_by(pitch as usize) {
            Line::new(Point::new(0, y as i32), Point::new(right, y as i32))
                .into_styled(style)
                .draw(display)?;
        }

        Ok(())
    }
}

/// Rectangle traced by the selection outline around `widget`.
///
/// Saturates at the coordinate limits instead of wrapping.
pub fn selection_outline(widget: &Widget) -> Rectangle {
    let margin = SELECTION_MARGIN_PX as i32;
    let grow = 2 * SELECTION_MARGIN_PX;
    Rectangle::new(
        Point::new(
            widget.x.saturating_sub(margin),
            widget.y.saturating_sub(margin),
        ),
        Size::new(
            widget.width.saturating_add(grow),
            widget.height.saturating_add(grow),
        ),
    )
}

fn draw_selection<D: DrawTarget<Color = Rgb565>>(
    widget: &Widget,
    display: &mut D,
) -> Result<(), D::Error> {
    let style = PrimitiveStyleBuilder::new()
        .stroke_color(SELECTION)
        .stroke_width(SELECTION_STROKE_PX)
        .build();
    selection_outline(widget).into_styled(style).draw(display)
}
