//! Binance kline feed.
//!
//! Streams candle updates over the combined kline WebSocket and back-fills
//! initial history through the REST klines endpoint. Parsed candles are
//! delivered to the per-timeframe pipeline channels; malformed payloads are
//! dropped and logged.

use std::collections::HashMap;

use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::error::{BotError, Result};
use crate::types::{Candle, Timeframe};

const BINANCE_WS_URL: &str = "wss://stream.binance.com:9443";
const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";
const RECONNECT_DELAY_SECS: u64 = 5;

/// Combined stream wrapper: {"stream": "...", "data": {...}}.
#[derive(Debug, Deserialize)]
struct StreamMessage {
    #[allow(dead_code)]
    stream: String,
    data: KlineEvent,
}

/// Kline event payload.
#[derive(Debug, Deserialize)]
struct KlineEvent {
    #[serde(rename = "k")]
    kline: KlinePayload,
}

#[derive(Debug, Deserialize)]
struct KlinePayload {
    #[serde(rename = "t")]
    open_time: i64,
    #[serde(rename = "T")]
    close_time: i64,
    #[serde(rename = "i")]
    interval: String,
    #[serde(rename = "o")]
    open: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "v")]
    volume: String,
    #[serde(rename = "x")]
    is_closed: bool,
}

impl KlinePayload {
    fn into_candle(self) -> Result<Candle> {
        let timeframe = Timeframe::from_str(&self.interval).ok_or_else(|| {
            BotError::MalformedCandle(format!("unknown interval: {}", self.interval))
        })?;
        let candle = Candle {
            open: parse_field(&self.open, "open")?,
            high: parse_field(&self.high, "high")?,
            low: parse_field(&self.low, "low")?,
            close: parse_field(&self.close, "close")?,
            volume: parse_field(&self.volume, "volume")?,
            open_time: self.open_time,
            close_time: self.close_time,
            timeframe,
            is_closed: self.is_closed,
        };
        candle.validate()?;
        Ok(candle)
    }
}

fn parse_field(raw: &str, field: &str) -> Result<f64> {
    raw.parse()
        .map_err(|_| BotError::MalformedCandle(format!("unparseable {field}: {raw}")))
}

/// Binance kline WebSocket stream with REST back-fill.
pub struct BinanceKlineStream {
    symbol: String,
    client: Client,
    senders: HashMap<Timeframe, mpsc::Sender<Candle>>,
}

impl BinanceKlineStream {
    pub fn new(symbol: String, senders: HashMap<Timeframe, mpsc::Sender<Candle>>) -> Self {
        let client = Client::builder()
            .user_agent("wicker/1.0")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            symbol,
            client,
            senders,
        }
    }

    fn stream_url(&self) -> String {
        let streams: Vec<String> = self
            .senders
            .keys()
            .map(|tf| format!("{}@kline_{}", self.symbol.to_lowercase(), tf.as_str()))
            .collect();
        format!("{}/stream?streams={}", BINANCE_WS_URL, streams.join("/"))
    }

    /// Load initial candle history for every monitored timeframe through
    /// the REST klines endpoint. The still-open last kline is excluded.
    pub async fn backfill(&self, limit: usize) {
        for (timeframe, sender) in &self.senders {
            match self.fetch_klines(*timeframe, limit + 1).await {
                Ok(candles) => {
                    let count = candles.len();
                    for candle in candles {
                        if sender.send(candle).await.is_err() {
                            return;
                        }
                    }
                    info!(
                        "loaded {} historical {} candles for {}",
                        count,
                        timeframe.as_str(),
                        self.symbol
                    );
                }
                Err(e) => {
                    // Best-effort: the window fills from the live stream
                    // when the REST call fails.
                    warn!(
                        "back-fill failed for {} {}: {}",
                        self.symbol,
                        timeframe.as_str(),
                        e
                    );
                }
            }
        }
    }

    async fn fetch_klines(&self, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/klines?symbol={}&interval={}&limit={}",
            BINANCE_API_URL,
            self.symbol.to_uppercase(),
            timeframe.as_str(),
            limit
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(BotError::Anyhow(anyhow::anyhow!(
                "Binance klines API error: {status}"
            )));
        }

        let rows: Vec<serde_json::Value> = response.json().await?;
        let mut candles = Vec::with_capacity(rows.len());
        // The last row is the still-open candle; skip it.
        for row in rows.iter().take(rows.len().saturating_sub(1)) {
            match parse_kline_row(row, timeframe) {
                Ok(candle) => candles.push(candle),
                Err(e) => warn!("skipping malformed historical kline: {}", e),
            }
        }
        Ok(candles)
    }

    /// Connect and stream candle updates until every pipeline channel has
    /// closed. Reconnects automatically on errors.
    pub async fn connect(&self) {
        loop {
            match self.run_connection().await {
                Ok(true) => {
                    info!("pipeline channels closed, stopping Binance stream");
                    return;
                }
                Ok(false) => {
                    warn!("Binance WebSocket disconnected, reconnecting...");
                }
                Err(e) => {
                    error!("Binance WebSocket error: {}, reconnecting...", e);
                }
            }
            tokio::time::sleep(tokio::time::Duration::from_secs(RECONNECT_DELAY_SECS)).await;
        }
    }

    /// Returns Ok(true) when the pipelines have shut down and the stream
    /// should stop for good.
    async fn run_connection(&self) -> Result<bool> {
        let url = self.stream_url();
        info!("connecting to Binance WebSocket: {}", url);
        let (ws_stream, _) = connect_async(&url).await.map_err(anyhow::Error::from)?;
        let (mut write, mut read) = ws_stream.split();
        info!("connected to Binance WebSocket");

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if self.handle_message(&text).await {
                        return Ok(true);
                    }
                }
                Ok(Message::Ping(data)) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Ok(Message::Close(_)) => {
                    info!("Binance WebSocket closed by server");
                    break;
                }
                Err(e) => {
                    error!("Binance WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        Ok(false)
    }

    /// Returns true when the receiving pipeline has gone away.
    async fn handle_message(&self, text: &str) -> bool {
        let msg: StreamMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(_) => return false, // non-kline frame, ignored
        };

        let candle = match msg.data.kline.into_candle() {
            Ok(c) => c,
            Err(e) => {
                warn!("dropped malformed candle update: {}", e);
                return false;
            }
        };

        debug!(
            "{} {} update: close {:.2} ({})",
            self.symbol,
            candle.timeframe.as_str(),
            candle.close,
            if candle.is_closed { "closed" } else { "live" }
        );

        if let Some(sender) = self.senders.get(&candle.timeframe) {
            if sender.send(candle).await.is_err() {
                return true;
            }
        }
        false
    }
}

/// Parse one REST kline row:
/// [openTime, open, high, low, close, volume, closeTime, ...].
fn parse_kline_row(row: &serde_json::Value, timeframe: Timeframe) -> Result<Candle> {
    let field = |i: usize| -> Result<f64> {
        row.get(i)
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| BotError::MalformedCandle(format!("bad kline field {i}")))
    };
    let time = |i: usize| -> Result<i64> {
        row.get(i)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| BotError::MalformedCandle(format!("bad kline timestamp {i}")))
    };

    let candle = Candle {
        open: field(1)?,
        high: field(2)?,
        low: field(3)?,
        close: field(4)?,
        volume: field(5)?,
        open_time: time(0)?,
        close_time: time(6)?,
        timeframe,
        is_closed: true,
    };
    candle.validate()?;
    Ok(candle)
}
