//! Mono font selection.
//!
//! Widgets ask for CSS-style pixel sizes; the surface only has fixed-size
//! ISO-8859-1 mono fonts (so `°` renders), so each request maps to the
//! largest font that fits.

use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::iso_8859_1::{
    FONT_4X6, FONT_5X8, FONT_6X9, FONT_6X10, FONT_7X13, FONT_7X13_BOLD, FONT_9X15, FONT_9X15_BOLD,
    FONT_9X18, FONT_10X20,
};

/// Clock lines ("bold 16px")
pub const CLOCK_FONT: &MonoFont<'static> = &FONT_9X15_BOLD;

/// Weather location label ("10px")
pub const LABEL_FONT: &MonoFont<'static> = &FONT_6X10;

/// Weather temperature/condition, stock symbol and price ("bold 12px")
pub const BODY_BOLD_FONT: &MonoFont<'static> = &FONT_7X13_BOLD;

/// Stock change line ("9px")
pub const SMALL_FONT: &MonoFont<'static> = &FONT_6X9;

/// Fonts available to the text widget, smallest first.
const SIZE_LADDER: [&MonoFont<'static>; 7] = [
    &FONT_4X6, &FONT_5X8, &FONT_6X10, &FONT_7X13, &FONT_9X15, &FONT_9X18, &FONT_10X20,
];

/// Largest font no taller than `px`, or the smallest font if none fits.
pub fn font_for_pixel_size(px: u32) -> &'static MonoFont<'static> {
    SIZE_LADDER
        .iter()
        .rev()
        .find(|font| font.character_size.height <= px)
        .copied()
        .unwrap_or(SIZE_LADDER[0])
}
