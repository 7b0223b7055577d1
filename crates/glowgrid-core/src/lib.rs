//! Widget data and render core for GlowGrid
//!
//! This crate holds everything the LED matrix simulator needs to turn a list
//! of widget records into pixels: the widget record and board, the
//! per-kind data caches, the remote fetchers that fill them, the renderers and
//! the render pipeline that dispatches to them.
//!
//! All drawing targets an `embedded-graphics` [`DrawTarget`] with `Rgb565`
//! pixels, so the same pipeline paints into the in-memory [`FrameBuffer`]
//! for tests and into an SDL window for the desktop simulator.
//!
//! [`DrawTarget`]: embedded_graphics::draw_target::DrawTarget
//! [`FrameBuffer`]: framebuffer::FrameBuffer

pub mod board;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod framebuffer;
pub mod pipeline;
pub mod render;
pub mod time;
pub mod widget;

pub use board::{BoardError, WidgetBoard};
pub use cache::{CacheEntry, DataCache};
pub use config::{ConfigError, GlowGridConfig};
pub use framebuffer::FrameBuffer;
pub use pipeline::RenderPipeline;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use widget::{Widget, WidgetConfig, WidgetId, WidgetKind};
