//! Market-data sources.

pub mod binance;

pub use binance::BinanceKlineStream;
