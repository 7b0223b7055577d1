//! Per-kind widget renderers.
//!
//! Each widget kind has one renderer implementing [`WidgetRenderer`] for its
//! config type. The [`RenderPipeline`](crate::pipeline::RenderPipeline)
//! selects the renderer with a single `match` over
//! [`WidgetConfig`](crate::widget::WidgetConfig), so adding a kind is a
//! compile error until every dispatch site handles it.
//!
//! Clock and text renderers complete without suspending. Weather and stock
//! renderers consult their cache first, start a background fetch when the
//! entry is missing or stale, and paint whatever entry exists at that moment.

pub mod clock;
pub mod fonts;
pub mod palette;
pub mod stock;
pub mod text;
pub mod weather;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;

use crate::widget::Widget;

pub use clock::ClockRenderer;
pub use stock::{StockCache, StockKey, StockRenderer};
pub use text::TextRenderer;
pub use weather::{WeatherCache, WeatherRenderer};

/// Paints one widget kind onto a display surface.
#[allow(async_fn_in_trait)]
pub trait WidgetRenderer {
    /// Kind-specific configuration this renderer consumes.
    type Config;

    /// Render `widget` using `config`.
    ///
    /// Data-backed implementations spawn their fetch on the ambient tokio
    /// runtime and must be awaited from within one.
    async fn render<D: DrawTarget<Color = Rgb565>>(
        &self,
        widget: &Widget,
        config: &Self::Config,
        display: &mut D,
    ) -> Result<(), D::Error>;
}

/// Draw a single left-aligned text line with its baseline at `position`.
pub(crate) fn draw_line_of_text<D: DrawTarget<Color = Rgb565>>(
    text: &str,
    position: Point,
    font: &'static MonoFont<'static>,
    color: Rgb565,
    display: &mut D,
) -> Result<(), D::Error> {
    Text::new(text, position, MonoTextStyle::new(font, color)).draw(display)?;
    Ok(())
}
