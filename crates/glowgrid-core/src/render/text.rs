//! Static text widget.

use std::borrow::Cow;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Text};

use super::WidgetRenderer;
use super::fonts::font_for_pixel_size;
use super::palette::TEXT_WHITE;
use crate::widget::{TextConfig, Widget};

/// Longest text drawn without truncation, in characters
pub const MAX_TEXT_CHARS: usize = 20;

/// Characters kept ahead of the ellipsis when truncating
pub const TRUNCATED_PREFIX_CHARS: usize = 17;

/// Font sizes above this are clamped
pub const MAX_FONT_SIZE_PX: u32 = 24;

/// Text as painted: anything longer than 20 characters becomes the first 17
/// followed by `...`.
pub fn display_text(text: &str) -> Cow<'_, str> {
    if text.chars().count() <= MAX_TEXT_CHARS {
        return Cow::Borrowed(text);
    }
    let mut truncated: String = text.chars().take(TRUNCATED_PREFIX_CHARS).collect();
    truncated.push_str("...");
    Cow::Owned(truncated)
}

pub fn effective_font_size(configured: u32) -> u32 {
    configured.min(MAX_FONT_SIZE_PX)
}

pub struct TextRenderer;

impl WidgetRenderer for TextRenderer {
    type Config = TextConfig;

    async fn render<D: DrawTarget<Color = Rgb565>>(
        &self,
        widget: &Widget,
        config: &TextConfig,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let size = effective_font_size(config.font_size);
        let style = MonoTextStyle::new(font_for_pixel_size(size), TEXT_WHITE);
        // Baseline sits one font size below the anchor; x is the center.
        let position = widget.anchor() + Point::new(0, size as i32);

        Text::with_alignment(&display_text(&config.text), position, style, Alignment::Center)
            .draw(display)?;
        Ok(())
    }
}
