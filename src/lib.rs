//! Wicker - Real-time Bollinger Band wick-touch trading signal engine
//!
//! Streams OHLCV candles, computes Bollinger Band variants for a set of
//! named configurations, detects precise candle-wick touches against the
//! band levels, and emits trading signals with stop-loss/take-profit risk
//! parameters.

pub mod config;
pub mod error;
pub mod services;
pub mod sinks;
pub mod sources;
pub mod types;

pub use config::Config;
pub use error::{BotError, Result};
pub use types::*;
