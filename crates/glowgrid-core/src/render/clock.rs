//! Clock widget: local time and date in two green lines.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use super::fonts::CLOCK_FONT;
use super::palette::CLOCK_GREEN;
use super::{WidgetRenderer, draw_line_of_text};
use crate::time::TimeSource;
use crate::widget::{ClockConfig, ClockFormat, Widget};

/// Baseline of the time line below the widget anchor
pub const TIME_LINE_OFFSET_PX: i32 = 20;

/// Baseline of the date line below the widget anchor
pub const DATE_LINE_OFFSET_PX: i32 = 40;

/// `13:05:09`, or `1:05:09 PM` in 12-hour mode.
pub fn format_time(now: &NaiveDateTime, format: ClockFormat) -> String {
    match format {
        ClockFormat::TwelveHour => now.format("%-I:%M:%S %p").to_string(),
        ClockFormat::TwentyFourHour => now.format("%H:%M:%S").to_string(),
    }
}

/// `Mon, Jan 6`
pub fn format_date(now: &NaiveDateTime) -> String {
    now.format("%a, %b %-d").to_string()
}

pub struct ClockRenderer {
    time: Arc<dyn TimeSource>,
}

impl ClockRenderer {
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self { time }
    }

    fn local_now(&self) -> NaiveDateTime {
        self.time.now().with_timezone(&Local).naive_local()
    }
}

impl WidgetRenderer for ClockRenderer {
    type Config = ClockConfig;

    async fn render<D: DrawTarget<Color = Rgb565>>(
        &self,
        widget: &Widget,
        config: &ClockConfig,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let now = self.local_now();
        let anchor = widget.anchor();

        draw_line_of_text(
            &format_time(&now, config.format),
            anchor + Point::new(0, TIME_LINE_OFFSET_PX),
            CLOCK_FONT,
            CLOCK_GREEN,
            display,
        )?;
        draw_line_of_text(
            &format_date(&now),
            anchor + Point::new(0, DATE_LINE_OFFSET_PX),
            CLOCK_FONT,
            CLOCK_GREEN,
            display,
        )
    }
}
