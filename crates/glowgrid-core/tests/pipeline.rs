//! End-to-end frames rendered into a `FrameBuffer`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeDelta, TimeZone, Utc};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Notify;

use glowgrid_core::config::{HttpConfig, WeatherSourceConfig};
use glowgrid_core::fetch::{
    DisabledGeolocator, HttpWeatherFetcher, StockData, StockFetcher, WeatherData, WeatherFetcher,
    build_http_client,
};
use glowgrid_core::render::palette::{
    CLOCK_GREEN, GRID_LINE, LED_OFF, SELECTION, SPARKLINE_BACKGROUND, WEATHER_DEFAULT,
    WEATHER_SUNNY,
};
use glowgrid_core::render::stock::{SPARKLINE_OFFSET_PX, SPARKLINE_SIZE};
use glowgrid_core::widget::{
    CURRENT_LOCATION, ClockConfig, ClockFormat, StockConfig, TextConfig, WeatherConfig,
};
use glowgrid_core::{
    FrameBuffer, GlowGridConfig, ManualTimeSource, RenderPipeline, Widget, WidgetBoard,
    WidgetConfig, WidgetId,
};

const SURFACE: Size = Size::new(320, 160);

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Counts calls and answers immediately with a fixed sunny report.
#[derive(Default)]
struct CountingWeather {
    calls: AtomicUsize,
}

#[async_trait]
impl WeatherFetcher for CountingWeather {
    async fn fetch(&self, config: &WeatherConfig) -> WeatherData {
        self.calls.fetch_add(1, Ordering::SeqCst);
        WeatherData {
            temp: 30,
            condition: "Sunny".into(),
            location: config.location.clone(),
        }
    }
}

/// Counts calls and holds every fetch until the gate is opened.
#[derive(Default)]
struct GatedStock {
    calls: AtomicUsize,
    gate: Notify,
}

#[async_trait]
impl StockFetcher for GatedStock {
    async fn fetch(&self, symbol: &str) -> StockData {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        let mut rng = StdRng::seed_from_u64(11);
        StockData::from_close_and_price(symbol, 100.0, 110.0, &mut rng)
    }
}

fn start_time() -> ManualTimeSource {
    ManualTimeSource::new(Utc.with_ymd_and_hms(2025, 1, 6, 13, 5, 9).unwrap())
}

fn pipeline_with(
    time: &ManualTimeSource,
    weather: Arc<dyn WeatherFetcher>,
    stock: Arc<dyn StockFetcher>,
) -> RenderPipeline {
    RenderPipeline::new(
        &GlowGridConfig::default(),
        Arc::new(time.clone()),
        weather,
        stock,
    )
}

/// Let spawned fetch tasks run until `done` holds.
async fn settle(mut done: impl FnMut() -> bool) {
    for _ in 0..100 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("background fetch did not settle");
}

fn rows(x: i32, top: i32, bottom_exclusive: i32) -> Rectangle {
    Rectangle::new(
        Point::new(x, top),
        Size::new(SURFACE.width - x as u32, (bottom_exclusive - top) as u32),
    )
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empty_board_draws_background_and_grid() {
    let time = start_time();
    let pipeline = pipeline_with(
        &time,
        Arc::new(CountingWeather::default()),
        Arc::new(GatedStock::default()),
    );
    let mut fb = FrameBuffer::new(SURFACE);

    pipeline.render_frame(&WidgetBoard::new(), &mut fb).await.unwrap();

    assert_eq!(fb.pixel(Point::new(0, 0)), Some(GRID_LINE));
    assert_eq!(fb.pixel(Point::new(5, 3)), Some(GRID_LINE));
    assert_eq!(fb.pixel(Point::new(3, 155)), Some(GRID_LINE));
    assert_eq!(fb.pixel(Point::new(1, 1)), Some(LED_OFF));
    assert_eq!(fb.pixel(Point::new(319, 159)), Some(LED_OFF));
}

#[tokio::test]
async fn test_clock_paints_two_green_lines() {
    let time = start_time();
    let pipeline = pipeline_with(
        &time,
        Arc::new(CountingWeather::default()),
        Arc::new(GatedStock::default()),
    );
    let mut board = WidgetBoard::new();
    board
        .add_widget(Widget::new(
            "clock-1",
            10,
            40,
            100,
            50,
            WidgetConfig::Clock(ClockConfig {
                format: ClockFormat::TwentyFourHour,
            }),
        ))
        .unwrap();
    let mut fb = FrameBuffer::new(SURFACE);

    pipeline.render_frame(&board, &mut fb).await.unwrap();

    // Time baseline at y+20 = 60, date baseline at y+40 = 80.
    assert!(fb.count_color(&rows(10, 45, 64), CLOCK_GREEN) > 0);
    assert!(fb.count_color(&rows(10, 65, 84), CLOCK_GREEN) > 0);
    assert_eq!(fb.count_color(&rows(0, 0, 45), CLOCK_GREEN), 0);
    assert_eq!(fb.count_color(&rows(0, 85, 160), CLOCK_GREEN), 0);
}

#[tokio::test]
async fn test_selection_outline_follows_selection() {
    let time = start_time();
    let pipeline = pipeline_with(
        &time,
        Arc::new(CountingWeather::default()),
        Arc::new(GatedStock::default()),
    );
    let mut board = WidgetBoard::new();
    board
        .add_widget(Widget::placed(
            "text-1",
            WidgetConfig::Text(TextConfig::default()),
        ))
        .unwrap();
    let mut fb = FrameBuffer::new(SURFACE);
    let around_text = Rectangle::new(Point::new(150, 0), Size::new(120, 70));

    pipeline.render_frame(&board, &mut fb).await.unwrap();
    assert_eq!(fb.count_color(&around_text, SELECTION), 0);

    let hit = board.hit_test(Point::new(200, 30)).map(|w| w.id.clone());
    assert_eq!(hit, Some(WidgetId::new("text-1")));
    board.select_widget(hit);

    pipeline.render_frame(&board, &mut fb).await.unwrap();
    assert!(fb.count_color(&around_text, SELECTION) > 0);

    board.select_widget(None);
    pipeline.render_frame(&board, &mut fb).await.unwrap();
    assert_eq!(fb.count_color(&around_text, SELECTION), 0);
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_weather_geolocation_failure_caches_and_paints_fallback() {
    let time = start_time();
    let weather = HttpWeatherFetcher::new(
        build_http_client(&HttpConfig::default()),
        &WeatherSourceConfig::default(),
        Arc::new(DisabledGeolocator),
    );
    let pipeline = pipeline_with(&time, Arc::new(weather), Arc::new(GatedStock::default()));

    let mut board = WidgetBoard::new();
    board
        .add_widget(Widget::placed(
            "weather-1",
            WidgetConfig::Weather(WeatherConfig {
                location: CURRENT_LOCATION.into(),
                ..Default::default()
            }),
        ))
        .unwrap();
    let id = WidgetId::new("weather-1");
    let mut fb = FrameBuffer::new(SURFACE);

    pipeline.render_frame(&board, &mut fb).await.unwrap();

    let entry = pipeline.weather_cache().get(&id).unwrap();
    assert!(entry.in_flight);
    assert_eq!(entry.payload, WeatherData::placeholder());

    let cache = pipeline.weather_cache().clone();
    settle(|| cache.get(&id).is_some_and(|entry| !entry.in_flight)).await;

    assert_eq!(
        pipeline.weather_cache().get(&id).unwrap().payload,
        WeatherData {
            temp: 22,
            condition: "Error fetching weather".into(),
            location: "Unknown".into(),
        }
    );

    pipeline.render_frame(&board, &mut fb).await.unwrap();
    let widget_area = Rectangle::new(Point::new(190, 110), Size::new(130, 50));
    assert!(fb.count_color(&widget_area, WEATHER_DEFAULT) > 0);
}

#[tokio::test]
async fn test_weather_refetches_only_once_ttl_elapses() {
    let time = start_time();
    let weather = Arc::new(CountingWeather::default());
    let pipeline = pipeline_with(&time, weather.clone(), Arc::new(GatedStock::default()));

    let mut board = WidgetBoard::new();
    board
        .add_widget(Widget::placed(
            "weather-1",
            WidgetConfig::Weather(WeatherConfig {
                location: "Pune".into(),
                ..Default::default()
            }),
        ))
        .unwrap();
    let id = WidgetId::new("weather-1");
    let cache = pipeline.weather_cache().clone();
    let mut fb = FrameBuffer::new(SURFACE);

    pipeline.render_frame(&board, &mut fb).await.unwrap();
    settle(|| cache.get(&id).is_some_and(|entry| !entry.in_flight)).await;
    assert_eq!(weather.calls.load(Ordering::SeqCst), 1);

    pipeline.render_frame(&board, &mut fb).await.unwrap();
    let widget_area = Rectangle::new(Point::new(190, 110), Size::new(130, 50));
    assert!(fb.count_color(&widget_area, WEATHER_SUNNY) > 0);

    time.advance(TimeDelta::minutes(10) - TimeDelta::seconds(1));
    pipeline.render_frame(&board, &mut fb).await.unwrap();
    tokio::task::yield_now().await;
    assert_eq!(weather.calls.load(Ordering::SeqCst), 1);

    time.advance(TimeDelta::seconds(1));
    pipeline.render_frame(&board, &mut fb).await.unwrap();
    settle(|| cache.get(&id).is_some_and(|entry| !entry.in_flight)).await;
    assert_eq!(weather.calls.load(Ordering::SeqCst), 2);
}

// ---------------------------------------------------------------------------
// Stock
// ---------------------------------------------------------------------------

fn tcs_widget() -> Widget {
    Widget::placed(
        "stock-1",
        WidgetConfig::Stock(StockConfig {
            symbol: "TCS".into(),
        }),
    )
}

fn sparkline_area(widget: &Widget) -> Rectangle {
    Rectangle::new(
        widget.anchor() + Point::new(0, SPARKLINE_OFFSET_PX),
        SPARKLINE_SIZE,
    )
}

#[tokio::test]
async fn test_stock_requested_twice_fetches_once() {
    let time = start_time();
    let stock = Arc::new(GatedStock::default());
    let pipeline = pipeline_with(&time, Arc::new(CountingWeather::default()), stock.clone());

    let widget = tcs_widget();
    let key = (widget.id.clone(), "TCS".to_owned());
    let cache = pipeline.stock_cache().clone();
    let mut fb = FrameBuffer::new(SURFACE);

    pipeline.render_widget(&widget, &mut fb).await.unwrap();
    let first = cache.get(&key).unwrap();
    pipeline.render_widget(&widget, &mut fb).await.unwrap();
    let second = cache.get(&key).unwrap();

    for entry in [&first, &second] {
        assert!(entry.in_flight);
        assert_eq!(entry.payload, StockData::placeholder("TCS"));
    }
    // Placeholder has no history, so no sparkline box was painted.
    assert_eq!(fb.count_color(&sparkline_area(&widget), SPARKLINE_BACKGROUND), 0);

    // Let the spawned fetch start and park on the gate.
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    assert_eq!(stock.calls.load(Ordering::SeqCst), 1);

    pipeline.render_widget(&widget, &mut fb).await.unwrap();
    assert_eq!(stock.calls.load(Ordering::SeqCst), 1);

    stock.gate.notify_one();
    settle(|| cache.get(&key).is_some_and(|entry| !entry.in_flight)).await;

    let resolved = cache.get(&key).unwrap().payload;
    assert_eq!(resolved.symbol, "TCS");
    assert_eq!(resolved.price, 110.0);
    assert_eq!(stock.calls.load(Ordering::SeqCst), 1);

    pipeline.render_widget(&widget, &mut fb).await.unwrap();
    assert!(fb.count_color(&sparkline_area(&widget), SPARKLINE_BACKGROUND) > 0);
    assert_eq!(stock.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stale_stock_keeps_payload_while_refetching() {
    let time = start_time();
    let stock = Arc::new(GatedStock::default());
    let pipeline = pipeline_with(&time, Arc::new(CountingWeather::default()), stock.clone());

    let widget = tcs_widget();
    let key = (widget.id.clone(), "TCS".to_owned());
    let cache = pipeline.stock_cache().clone();
    let mut fb = FrameBuffer::new(SURFACE);

    pipeline.render_widget(&widget, &mut fb).await.unwrap();
    stock.gate.notify_one();
    settle(|| cache.get(&key).is_some_and(|entry| !entry.in_flight)).await;

    time.advance(TimeDelta::minutes(5));
    pipeline.render_widget(&widget, &mut fb).await.unwrap();
    pipeline.render_widget(&widget, &mut fb).await.unwrap();

    let entry = cache.get(&key).unwrap();
    assert!(entry.in_flight);
    assert_eq!(entry.payload.price, 110.0);

    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    assert_eq!(stock.calls.load(Ordering::SeqCst), 2);

    stock.gate.notify_one();
    settle(|| cache.get(&key).is_some_and(|entry| !entry.in_flight)).await;
    assert_eq!(
        cache.get(&key).unwrap().fetched_at,
        Utc.with_ymd_and_hms(2025, 1, 6, 13, 10, 9).unwrap()
    );
}

#[tokio::test]
async fn test_symbol_change_uses_new_cache_key() {
    let time = start_time();
    let stock = Arc::new(GatedStock::default());
    let pipeline = pipeline_with(&time, Arc::new(CountingWeather::default()), stock.clone());

    let mut board = WidgetBoard::new();
    board.add_widget(tcs_widget()).unwrap();
    let mut fb = FrameBuffer::new(SURFACE);

    pipeline.render_frame(&board, &mut fb).await.unwrap();

    let updated = tcs_widget().with_config(WidgetConfig::Stock(StockConfig {
        symbol: "INFY".into(),
    }));
    board.update_widget(updated).unwrap();
    pipeline.render_frame(&board, &mut fb).await.unwrap();

    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    assert_eq!(stock.calls.load(Ordering::SeqCst), 2);
    assert_eq!(pipeline.stock_cache().len(), 2);
}
