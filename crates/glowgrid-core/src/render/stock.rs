//! Stock ticker widget: symbol, price, change line and a trend sparkline.
//!
//! Quotes are cached per `(widget id, symbol)`, so changing a widget's symbol
//! starts a fresh fetch while the previous symbol's entry stays cached.

use std::sync::Arc;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Polyline, Rectangle};
use log::debug;

use super::fonts::{BODY_BOLD_FONT, SMALL_FONT};
use super::palette::{
    CHANGE_DOWN, CHANGE_UP, SPARKLINE_BACKGROUND, SPARKLINE_LINE, SPARKLINE_POINT_HIGH,
    SPARKLINE_POINT_LOW, TEXT_WHITE,
};
use super::{WidgetRenderer, draw_line_of_text};
use crate::cache::DataCache;
use crate::fetch::{StockData, StockFetcher};
use crate::time::TimeSource;
use crate::widget::{StockConfig, Widget, WidgetId};

/// Cache key of a stock quote: the widget and the symbol it shows.
pub type StockKey = (WidgetId, String);

/// Stock payloads keyed by `(widget id, symbol)`.
pub type StockCache = DataCache<StockKey, StockData>;

/// Prefix for prices
pub const CURRENCY_PREFIX: &str = "Rs";

pub const SYMBOL_LINE_OFFSET_PX: i32 = 12;
pub const PRICE_LINE_OFFSET_PX: i32 = 24;
pub const CHANGE_LINE_OFFSET_PX: i32 = 35;

/// Top edge of the sparkline box below the widget anchor
pub const SPARKLINE_OFFSET_PX: i32 = 40;

pub const SPARKLINE_SIZE: Size = Size::new(110, 35);

/// Side of the square dot marking each sample
const SPARKLINE_DOT_PX: u32 = 2;

/// `Rs3850.25`
pub fn format_price(price: f64) -> String {
    format!("{}{:.2}", CURRENCY_PREFIX, price)
}

fn sign_prefix(value: f64) -> &'static str {
    if value >= 0.0 { "+" } else { "" }
}

/// `+50.25 (+1.32%)` or `-12.00 (-0.40%)`
pub fn format_change(change: f64, change_percent: f64) -> String {
    format!(
        "{}{:.2} ({}{:.2}%)",
        sign_prefix(change),
        change,
        sign_prefix(change_percent),
        change_percent
    )
}

pub fn change_color(change: f64) -> Rgb565 {
    if change >= 0.0 { CHANGE_UP } else { CHANGE_DOWN }
}

// ============================================================================
// Sparkline
// ============================================================================

/// Map samples onto `area`, oldest at the left edge and newest at the right,
/// highest at the top edge and lowest at the bottom edge.
///
/// Returns an empty list for fewer than two samples. A flat history maps
/// every sample onto the bottom edge.
pub fn sparkline_points(history: &[f64], area: Rectangle) -> Vec<Point> {
    if history.len() < 2 {
        return Vec::new();
    }

    let min = history.iter().copied().fold(f64::INFINITY, f64::min);
    let max = history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };

    let width = area.size.width.saturating_sub(1) as f64;
    let height = area.size.height.saturating_sub(1) as f64;
    let step = width / (history.len() - 1) as f64;

    history
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let x = (i as f64 * step).round() as i32;
            let y = (height - (value - min) / range * height).round() as i32;
            area.top_left + Point::new(x, y)
        })
        .collect()
}

/// Paint the sparkline box for `history` into `area`.
///
/// Nothing is drawn for fewer than two samples.
pub fn draw_sparkline<D: DrawTarget<Color = Rgb565>>(
    history: &[f64],
    area: Rectangle,
    display: &mut D,
) -> Result<(), D::Error> {
    let points = sparkline_points(history, area);
    if points.is_empty() {
        return Ok(());
    }

    area.into_styled(PrimitiveStyle::with_fill(SPARKLINE_BACKGROUND))
        .draw(display)?;

    let first = history[0];
    for (point, value) in points.iter().zip(history) {
        let color = if *value >= first {
            SPARKLINE_POINT_HIGH
        } else {
            SPARKLINE_POINT_LOW
        };
        Rectangle::new(*point, Size::new(SPARKLINE_DOT_PX, SPARKLINE_DOT_PX))
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(display)?;
    }

    Polyline::new(&points)
        .into_styled(PrimitiveStyle::with_stroke(SPARKLINE_LINE, 1))
        .draw(display)
}

// ============================================================================
// Renderer
// ============================================================================

pub struct StockRenderer {
    cache: StockCache,
    fetcher: Arc<dyn StockFetcher>,
    time: Arc<dyn TimeSource>,
}

impl StockRenderer {
    pub fn new(cache: StockCache, fetcher: Arc<dyn StockFetcher>, time: Arc<dyn TimeSource>) -> Self {
        Self {
            cache,
            fetcher,
            time,
        }
    }

    pub fn cache(&self) -> &StockCache {
        &self.cache
    }

    pub fn cache_key(widget: &Widget, config: &StockConfig) -> StockKey {
        (widget.id.clone(), config.symbol.clone())
    }

    /// Start a background fetch for the widget's symbol if its entry is
    /// absent or stale and none is outstanding. Returns whether a fetch was
    /// started.
    pub fn ensure_fresh(&self, widget: &Widget, config: &StockConfig) -> bool {
        let key = Self::cache_key(widget, config);
        if !self
            .cache
            .begin_fetch(&key, self.time.now(), StockData::placeholder(&config.symbol))
        {
            return false;
        }

        debug!("Fetching quote for {} (widget {})", config.symbol, widget.id);
        let cache = self.cache.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let time = Arc::clone(&self.time);

        tokio::spawn(async move {
            let data = fetcher.fetch(&key.1).await;
            debug!("Quote for {} settled at {:.2}", data.symbol, data.price);
            cache.resolve(key, data, time.now());
        });
        true
    }
}

impl WidgetRenderer for StockRenderer {
    type Config = StockConfig;

    async fn render<D: DrawTarget<Color = Rgb565>>(
        &self,
        widget: &Widget,
        config: &StockConfig,
        display: &mut D,
    ) -> Result<(), D::Error> {
        self.ensure_fresh(widget, config);

        let data = self
            .cache
            .get(&Self::cache_key(widget, config))
            .map(|entry| entry.payload)
            .unwrap_or_else(|| StockData::placeholder(&config.symbol));
        let anchor = widget.anchor();

        draw_line_of_text(
            &data.symbol,
            anchor + Point::new(0, SYMBOL_LINE_OFFSET_PX),
            BODY_BOLD_FONT,
            TEXT_WHITE,
            display,
        )?;
        draw_line_of_text(
            &format_price(data.price),
            anchor + Point::new(0, PRICE_LINE_OFFSET_PX),
            BODY_BOLD_FONT,
            TEXT_WHITE,
            display,
        )?;
        draw_line_of_text(
            &format_change(data.change, data.change_percent),
            anchor + Point::new(0, CHANGE_LINE_OFFSET_PX),
            SMALL_FONT,
            change_color(data.change),
            display,
        )?;

        let area = Rectangle::new(anchor + Point::new(0, SPARKLINE_OFFSET_PX), SPARKLINE_SIZE);
        draw_sparkline(&data.price_history, area, display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(3850.256), "Rs3850.26");
        assert_eq!(format_price(0.0), "Rs0.00");
    }

    #[test]
    fn test_change_line_sign_prefix() {
        assert_eq!(format_change(50.25, 1.3177), "+50.25 (+1.32%)");
        assert_eq!(format_change(0.0, 0.0), "+0.00 (+0.00%)");
        assert_eq!(format_change(-12.0, -0.4), "-12.00 (-0.40%)");
    }

    #[test]
    fn test_change_color() {
        assert_eq!(change_color(0.0), CHANGE_UP);
        assert_eq!(change_color(3.5), CHANGE_UP);
        assert_eq!(change_color(-0.01), CHANGE_DOWN);
    }

    #[test]
    fn test_sparkline_points_span_area() {
        let area = Rectangle::new(Point::new(10, 40), Size::new(110, 35));
        let points = sparkline_points(&[100.0, 150.0, 125.0, 200.0], area);

        assert_eq!(points.len(), 4);
        assert_eq!(points[0], Point::new(10, 74));
        assert_eq!(points[3], Point::new(119, 40));
        assert!(points.iter().all(|p| area.contains(*p)));
    }

    #[test]
    fn test_sparkline_needs_two_samples() {
        let area = Rectangle::new(Point::zero(), SPARKLINE_SIZE);
        assert!(sparkline_points(&[], area).is_empty());
        assert!(sparkline_points(&[42.0], area).is_empty());

        let mut fb = FrameBuffer::new(Size::new(120, 40));
        draw_sparkline(&[42.0], area, &mut fb).unwrap();
        assert!(!fb.is_dirty());
    }

    #[test]
    fn test_flat_sparkline_sits_on_bottom_edge() {
        let area = Rectangle::new(Point::zero(), SPARKLINE_SIZE);
        let points = sparkline_points(&[5.0, 5.0, 5.0], area);
        assert!(points.iter().all(|p| p.y == 34));
    }

    #[test]
    fn test_sparkline_paints_background_and_line() {
        let area = Rectangle::new(Point::new(5, 5), SPARKLINE_SIZE);
        let mut fb = FrameBuffer::new(Size::new(130, 50));
        draw_sparkline(&[10.0, 8.0, 12.0, 14.0], area, &mut fb).unwrap();

        assert!(fb.count_color(&area, SPARKLINE_BACKGROUND) > 0);
        assert!(fb.count_color(&area, SPARKLINE_LINE) > 0);
    }

    #[test]
    fn test_sparkline_dots_hang_from_their_sample() {
        let area = Rectangle::new(Point::new(5, 5), SPARKLINE_SIZE);
        let mut fb = FrameBuffer::new(Size::new(130, 50));
        // Samples land on (5, 39) and (114, 5).
        draw_sparkline(&[10.0, 20.0], area, &mut fb).unwrap();

        assert_eq!(fb.pixel(Point::new(5, 40)), Some(SPARKLINE_POINT_HIGH));
        assert_eq!(fb.pixel(Point::new(115, 6)), Some(SPARKLINE_POINT_HIGH));

        let left_of_box = Rectangle::new(Point::zero(), Size::new(5, 50));
        let above_box = Rectangle::new(Point::zero(), Size::new(130, 5));
        for outside in [left_of_box, above_box] {
            assert_eq!(fb.count_color(&outside, SPARKLINE_POINT_HIGH), 0);
            assert_eq!(fb.count_color(&outside, SPARKLINE_POINT_LOW), 0);
        }
    }
}
