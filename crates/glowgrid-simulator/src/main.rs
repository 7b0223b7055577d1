//! Desktop simulator for the GlowGrid LED matrix widgets.
//!
//! Renders the widget board in an SDL2 window via `embedded-graphics-simulator`
//! and stands in for the editing UI with keyboard and mouse commands.
//!
//! # Key bindings
//!
//! | Key | Action                                        |
//! |-----|-----------------------------------------------|
//! | 1   | Add clock widget                              |
//! | 2   | Add weather widget                            |
//! | 3   | Add text widget                               |
//! | 4   | Add stock widget                              |
//! | S   | Next catalog symbol for the selected stock    |
//! | U   | Toggle clock format / temperature unit        |
//! | Esc | Deselect                                      |
//! | C   | Clear all widgets                             |
//! | Q   | Quit                                          |
//!
//! Mouse clicks select the widget under the pointer.
//!
//! The optional first argument is a TOML config path. A `.env` file in the
//! working directory is loaded before the environment is read.

use std::sync::Arc;
use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{error, info, warn};

use glowgrid_core::board::scale_to_surface;
use glowgrid_core::widget::{StockConfig, catalog_entry, next_catalog_symbol};
use glowgrid_core::{
    FrameBuffer, GlowGridConfig, RenderPipeline, SystemTimeSource, Widget, WidgetBoard,
    WidgetConfig, WidgetId, WidgetKind,
};

// ---------------------------------------------------------------------------
// Display constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Interval between unconditional redraws, so the clock ticks and settled
/// fetches appear.
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Editing commands
// ---------------------------------------------------------------------------

/// Allocates widget ids not yet used on the board.
struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    fn new() -> Self {
        Self { next: 1 }
    }

    fn allocate(&mut self, kind: WidgetKind, board: &WidgetBoard) -> WidgetId {
        loop {
            let id = WidgetId::new(format!("{}-{}", kind, self.next));
            self.next += 1;
            if board.widget(&id).is_none() {
                return id;
            }
        }
    }
}

fn keycode_to_kind(keycode: Keycode) -> Option<WidgetKind> {
    match keycode {
        Keycode::Num1 | Keycode::Kp1 => Some(WidgetKind::Clock),
        Keycode::Num2 | Keycode::Kp2 => Some(WidgetKind::Weather),
        Keycode::Num3 | Keycode::Kp3 => Some(WidgetKind::Text),
        Keycode::Num4 | Keycode::Kp4 => Some(WidgetKind::Stock),
        _ => None,
    }
}

fn add_widget(board: &mut WidgetBoard, ids: &mut IdAllocator, kind: WidgetKind) {
    let id = ids.allocate(kind, board);
    let widget = Widget::placed(id, WidgetConfig::default_for(kind));
    if let Err(e) = board.add_widget(widget) {
        warn!("Add rejected: {}", e);
    }
}

/// Replacement config for the selected widget, if the key edits it.
fn edited_config(keycode: Keycode, config: &WidgetConfig) -> Option<WidgetConfig> {
    match (keycode, config) {
        (Keycode::S, WidgetConfig::Stock(stock)) => {
            let symbol = next_catalog_symbol(&stock.symbol);
            if let Some(entry) = catalog_entry(symbol) {
                info!("Ticker {}: {} ({})", entry.symbol, entry.name, entry.tier);
            }
            Some(WidgetConfig::Stock(StockConfig {
                symbol: symbol.to_owned(),
            }))
        }
        (Keycode::U, WidgetConfig::Clock(clock)) => {
            let mut clock = *clock;
            clock.format = clock.format.toggled();
            Some(WidgetConfig::Clock(clock))
        }
        (Keycode::U, WidgetConfig::Weather(weather)) => {
            let mut weather = weather.clone();
            weather.unit = weather.unit.toggled();
            Some(WidgetConfig::Weather(weather))
        }
        _ => None,
    }
}

fn edit_selected(board: &mut WidgetBoard, keycode: Keycode) -> bool {
    let Some(selected) = board.selected_widget() else {
        return false;
    };
    let Some(config) = edited_config(keycode, &selected.config) else {
        return false;
    };

    let updated = selected.with_config(config);
    info!("Updating widget {}: {:?}", updated.id, updated.config);
    match board.update_widget(updated) {
        Ok(()) => true,
        Err(e) => {
            warn!("Update rejected: {}", e);
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn load_config() -> GlowGridConfig {
    match std::env::args().nth(1) {
        Some(path) => match GlowGridConfig::load(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path);
                config
            }
            Err(e) => {
                error!("{}; falling back to defaults", e);
                default_config()
            }
        },
        None => default_config(),
    }
}

fn default_config() -> GlowGridConfig {
    let mut config = GlowGridConfig::default();
    config.apply_env_overrides();
    config
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = load_config();
    let surface = config.display.size();

    info!("Starting GlowGrid simulator");
    info!(
        "Display: {}×{} (scale {}×)",
        surface.width, surface.height, WINDOW_SCALE
    );
    info!("Keys: 1=Clock  2=Weather  3=Text  4=Stock  S=Symbol  U=Unit/Format  Esc=Deselect  C=Clear  Q=Quit");

    let pipeline = RenderPipeline::from_config(&config, Arc::new(SystemTimeSource));
    let mut board = WidgetBoard::from_widgets(config.widgets.iter().cloned());
    let mut ids = IdAllocator::new();

    // SDL2 display and window
    let mut display = SimulatorDisplay::<Rgb565>::new(surface);
    let mut framebuffer = FrameBuffer::new(surface);

    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("GlowGrid Simulator", &output_settings);

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    let _ = display.clear(Rgb565::BLACK);
    window.update(&display);

    let mut needs_redraw = true;
    let mut last_refresh = Instant::now();

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = Instant::now();

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown { keycode, .. } => {
                    if keycode == Keycode::Q {
                        break 'running;
                    }

                    if let Some(kind) = keycode_to_kind(keycode) {
                        add_widget(&mut board, &mut ids, kind);
                        needs_redraw = true;
                    } else if keycode == Keycode::Escape {
                        board.select_widget(None);
                        needs_redraw = true;
                    } else if keycode == Keycode::C {
                        info!("Clearing {} widgets", board.len());
                        board.clear_all();
                        needs_redraw = true;
                    } else if edit_selected(&mut board, keycode) {
                        needs_redraw = true;
                    }
                }

                SimulatorEvent::MouseButtonDown { point, .. } => {
                    // Events arrive in display pixels; the surface may differ.
                    let point = scale_to_surface(point, display.size(), surface);
                    let hit = board.hit_test(point).map(|widget| widget.id.clone());
                    if let Some(id) = hit {
                        info!("Selected widget {}", id);
                        board.select_widget(Some(id));
                        needs_redraw = true;
                    }
                }

                _ => {}
            }
        }

        // --- Periodic refresh ---------------------------------------------
        if last_refresh.elapsed() >= REFRESH_INTERVAL {
            needs_redraw = true;
        }

        // --- Render -------------------------------------------------------
        if needs_redraw {
            match pipeline.render_frame(&board, &mut framebuffer).await {
                Ok(()) => {
                    let _ = framebuffer.flush(&mut display);
                }
                Err(e) => error!("Draw error: {:?}", e),
            }
            needs_redraw = false;
            last_refresh = Instant::now();
        }

        window.update(&display);

        // --- Frame pacing -------------------------------------------------
        // Yielding to the runtime here lets spawned fetches make progress.
        let elapsed = frame_start.elapsed();
        tokio::time::sleep(FRAME_DURATION.saturating_sub(elapsed)).await;
    }

    info!("Simulator exiting");
}
