//! LED matrix color palette
//!
//! Colors are specified as 8-bit `0xRRGGBB` and packed into RGB565
//! (R>>3, G>>2, B>>3), the pixel format of the display surface.

use embedded_graphics::pixelcolor::Rgb565;

/// Pack an 8-bit-per-channel `0xRRGGBB` value into RGB565.
pub const fn hex(rgb: u32) -> Rgb565 {
    let r = ((rgb >> 16) & 0xff) as u8;
    let g = ((rgb >> 8) & 0xff) as u8;
    let b = (rgb & 0xff) as u8;
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

// ============================================================================
// Surface
// ============================================================================

/// Unlit LED background
pub const LED_OFF: Rgb565 = hex(0x111111);

/// Grid lines separating individual LEDs
pub const GRID_LINE: Rgb565 = hex(0x222222);

/// Outline around the selected widget
pub const SELECTION: Rgb565 = hex(0xffff00);

// ============================================================================
// Widget text
// ============================================================================

/// Clock accent color
pub const CLOCK_GREEN: Rgb565 = hex(0x00ff00);

/// Plain text, stock symbol and price
pub const TEXT_WHITE: Rgb565 = hex(0xffffff);

/// Non-negative price change
pub const CHANGE_UP: Rgb565 = hex(0x00ff00);

/// Negative price change
pub const CHANGE_DOWN: Rgb565 = hex(0xff0000);

// ============================================================================
// Weather condition colors
// ============================================================================

pub const WEATHER_SUNNY: Rgb565 = hex(0xffff00);
pub const WEATHER_CLOUDY: Rgb565 = hex(0xcccccc);
pub const WEATHER_RAIN: Rgb565 = hex(0x0080ff);
pub const WEATHER_SNOW: Rgb565 = hex(0xffffff);
pub const WEATHER_STORM: Rgb565 = hex(0x800080);
pub const WEATHER_DEFAULT: Rgb565 = hex(0xffa500);

// ============================================================================
// Sparkline
// ============================================================================

pub const SPARKLINE_BACKGROUND: Rgb565 = hex(0x1a1a1a);
pub const SPARKLINE_LINE: Rgb565 = hex(0xff3333);

/// Sample at or above the first sample
pub const SPARKLINE_POINT_HIGH: Rgb565 = hex(0xff4444);

/// Sample below the first sample
pub const SPARKLINE_POINT_LOW: Rgb565 = hex(0xff2222);
