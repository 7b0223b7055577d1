//! RAM-backed LED matrix surface with change detection.
//!
//! The render pipeline draws every frame into this buffer. Afterwards only the
//! rectangular region containing changed pixels is flushed to the real output
//! (the simulator window), and tests read pixels back directly.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::trace;

/// Bounding box of pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    /// Expand the dirty region to include the given pixel coordinate.
    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }
}

/// Heap framebuffer implementing `DrawTarget<Color = Rgb565>`.
///
/// Writes outside the surface are clipped. A dirty bounding box is tracked
/// so [`flush`](Self::flush) only copies what changed.
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb565>,
    dirty: Option<DirtyRect>,
}

impl FrameBuffer {
    /// Allocate a framebuffer of the given size filled with black pixels.
    pub fn new(size: Size) -> Self {
        let width = size.width as usize;
        let height = size.height as usize;
        Self {
            width,
            height,
            pixels: vec![Rgb565::BLACK; width * height],
            dirty: None,
        }
    }

    /// Read back a single pixel. Returns `None` outside the surface.
    pub fn pixel(&self, point: Point) -> Option<Rgb565> {
        let (x, y) = self.index_of(point)?;
        Some(self.pixels[y * self.width + x])
    }

    /// Whether any pixel changed since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    /// Count the pixels of `color` inside `area` (clipped to the surface).
    pub fn count_color(&self, area: &Rectangle, color: Rgb565) -> usize {
        area.points()
            .filter(|p| self.pixel(*p) == Some(color))
            .count()
    }

    fn index_of(&self, point: Point) -> Option<(usize, usize)> {
        let x = usize::try_from(point.x).ok()?;
        let y = usize::try_from(point.y).ok()?;
        (x < self.width && y < self.height).then_some((x, y))
    }

    /// Write a single pixel, expanding the dirty rect only if the color changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb565) {
        let idx = y * self.width + x;
        if self.pixels[idx] != color {
            self.pixels[idx] = color;
            match &mut self.dirty {
                Some(rect) => rect.expand(x, y),
                None => self.dirty = Some(DirtyRect::from_point(x, y)),
            }
        }
    }

    /// Flush the dirty region to another draw target, then reset the dirty state.
    ///
    /// If nothing changed, this is a no-op.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(rect) = self.dirty.take() else {
            return Ok(());
        };

        let width = rect.max_x - rect.min_x + 1;
        let height = rect.max_y - rect.min_y + 1;

        trace!(
            "Flushing {}x{} dirty region at ({}, {})",
            width, height, rect.min_x, rect.min_y
        );

        let area = Rectangle::new(
            Point::new(rect.min_x as i32, rect.min_y as i32),
            Size::new(width as u32, height as u32),
        );

        let pixels = &self.pixels;
        let stride = self.width;
        let pixel_iter = (rect.min_y..=rect.max_y).flat_map(move |y| {
            let row_start = y * stride + rect.min_x;
            pixels[row_start..row_start + width].iter().copied()
        });

        display.fill_contiguous(&area, pixel_iter)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if let Some((x, y)) = self.index_of(coord) {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.bounding_box());
        if clipped.is_zero_sized() {
            return Ok(());
        }

        let x_start = clipped.top_left.x as usize;
        let y_start = clipped.top_left.y as usize;
        let x_end = x_start + clipped.size.width as usize;
        let y_end = y_start + clipped.size.height as usize;

        for y in y_start..y_end {
            for x in x_start..x_end {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}
