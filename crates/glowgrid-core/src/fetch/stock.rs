//! Stock quote fetcher backed by the Alpha Vantage `GLOBAL_QUOTE` endpoint.
//!
//! A successful quote and every mock quote carry a synthesized 20-point
//! price history used only for the sparkline.

use async_trait::async_trait;
use log::{info, warn};
use rand::Rng;
use serde_json::Value;

use super::{FetchError, get_json};
use crate::config::StockSourceConfig;

/// Number of samples in a synthesized price history
pub const HISTORY_POINTS: usize = 20;

/// Jitter applied to each history sample, as a fraction of the price range
pub const HISTORY_JITTER_FRACTION: f64 = 0.1;

/// History samples never drop below this fraction of the starting price
pub const HISTORY_FLOOR_FRACTION: f64 = 0.8;

/// Previous close assumed when the quote omits it, as a fraction of price
pub const MISSING_CLOSE_FRACTION: f64 = 0.99;

/// Fixed-capacity sparkline samples.
pub type PriceHistory = heapless::Vec<f64, HISTORY_POINTS>;

/// Quote payload painted by the stock widget.
#[derive(Debug, Clone, PartialEq)]
pub struct StockData {
    /// Upper-cased ticker
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub price_history: PriceHistory,
}

impl StockData {
    /// Payload shown while the first fetch for a key is outstanding.
    pub fn placeholder(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            price: 0.0,
            change: 0.0,
            change_percent: 0.0,
            price_history: PriceHistory::new(),
        }
    }

    /// Build a quote from a previous close and current price.
    pub fn from_close_and_price<R: Rng + ?Sized>(
        symbol: &str,
        previous_close: f64,
        price: f64,
        rng: &mut R,
    ) -> Self {
        let (change, change_percent) = change_metrics(previous_close, price);
        Self {
            symbol: symbol.to_uppercase(),
            price,
            change,
            change_percent,
            price_history: generate_price_history(previous_close, price, rng),
        }
    }
}

/// `(price - previous_close, 100 * change / previous_close)`
pub fn change_metrics(previous_close: f64, price: f64) -> (f64, f64) {
    let change = price - previous_close;
    (change, change / previous_close * 100.0)
}

/// Synthesize a history drifting linearly from `start` to `end`.
///
/// Each sample gets up to ±5% of `|end - start|` jitter and is floored at
/// 80% of `start`.
pub fn generate_price_history<R: Rng + ?Sized>(start: f64, end: f64, rng: &mut R) -> PriceHistory {
    let range = (end - start).abs();
    let floor = start * HISTORY_FLOOR_FRACTION;
    let mut history = PriceHistory::new();

    for i in 0..HISTORY_POINTS {
        let progress = i as f64 / (HISTORY_POINTS - 1) as f64;
        let jitter = (rng.r#gen::<f64>() - 0.5) * range * HISTORY_JITTER_FRACTION;
        let sample = start + (end - start) * progress + jitter;
        // Capacity is HISTORY_POINTS, so this never overflows.
        let _ = history.push(sample.max(floor));
    }

    history
}

/// Price band a mock quote is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBand {
    /// Endpoint answered but had no usable quote (demo key, unknown ticker)
    NoQuote,
    /// Endpoint unreachable or unparseable
    Unreachable,
}

impl MockBand {
    /// `(min price, price spread, max absolute change)`
    fn parameters(&self) -> (f64, f64, f64) {
        match self {
            MockBand::NoQuote => (1000.0, 5000.0, 50.0),
            MockBand::Unreachable => (2500.0, 2000.0, 25.0),
        }
    }
}

/// Entirely synthetic quote for `symbol`.
pub fn mock_quote<R: Rng + ?Sized>(symbol: &str, band: MockBand, rng: &mut R) -> StockData {
    let (min_price, spread, max_change) = band.parameters();
    let price = min_price + rng.r#gen::<f64>() * spread;
    let change = (rng.r#gen::<f64>() - 0.5) * 2.0 * max_change;
    StockData::from_close_and_price(symbol, price - change, price, rng)
}

/// Produces a quote for a ticker. Never fails.
#[async_trait]
pub trait StockFetcher: Send + Sync {
    async fn fetch(&self, symbol: &str) -> StockData;
}

/// HTTP quote fetcher.
pub struct HttpStockFetcher {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    exchange_suffix: String,
}

impl HttpStockFetcher {
    pub fn new(client: reqwest::Client, config: &StockSourceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            exchange_suffix: config.exchange_suffix.clone(),
        }
    }

    fn request_url(&self, symbol: &str) -> Result<reqwest::Url, FetchError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|_| FetchError::InvalidUrl(self.base_url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("query");
        url.query_pairs_mut()
            .append_pair("function", "GLOBAL_QUOTE")
            .append_pair(
                "symbol",
                &format!("{}.{}", symbol.to_uppercase(), self.exchange_suffix),
            )
            .append_pair("apikey", &self.api_key);
        Ok(url)
    }

    /// Returns `(previous_close, price)`.
    async fn try_fetch(&self, symbol: &str) -> Result<(f64, f64), FetchError> {
        let body = get_json(&self.client, self.request_url(symbol)?).await?;
        parse_quote(&body)
    }
}

#[async_trait]
impl StockFetcher for HttpStockFetcher {
    async fn fetch(&self, symbol: &str) -> StockData {
        let result = self.try_fetch(symbol).await;
        let mut rng = rand::thread_rng();
        match result {
            Ok((previous_close, price)) => {
                StockData::from_close_and_price(symbol, previous_close, price, &mut rng)
            }
            Err(FetchError::NoQuote) => {
                info!("No quote for {}, using demo data", symbol);
                mock_quote(symbol, MockBand::NoQuote, &mut rng)
            }
            Err(e) => {
                warn!("Failed to fetch quote for {}: {}", symbol, e);
                mock_quote(symbol, MockBand::Unreachable, &mut rng)
            }
        }
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    value
        .as_str()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .or_else(|| value.as_f64())
        .filter(|n| n.is_finite())
}

/// Extract `(previous_close, price)` from a `GLOBAL_QUOTE` body.
pub fn parse_quote(body: &Value) -> Result<(f64, f64), FetchError> {
    let quote = &body["Global Quote"];
    let price = parse_number(&quote["05. price"]).ok_or(FetchError::NoQuote)?;
    let previous_close = parse_number(&quote["08. previous close"])
        .filter(|close| *close != 0.0)
        .unwrap_or(price * MISSING_CLOSE_FRACTION);
    Ok((previous_close, price))
}
