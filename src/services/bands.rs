//! Bollinger Band calculation engine.
//!
//! Computes the middle band as one of five moving-average kinds over
//! closing prices, then derives the upper and lower bands from the rolling
//! standard deviation and the configured multiplier.

use crate::error::{BotError, Result};
use crate::types::{BandConfig, BandSet, Candle, MaKind};

/// Compute the band set for a configuration over the trailing `period`
/// candles of `candles`.
///
/// Fails with `InsufficientData` when fewer than `period` candles are
/// available. Results are deterministic for identical input sequences.
pub fn compute_bands(candles: &[Candle], config: &BandConfig) -> Result<BandSet> {
    if candles.len() < config.period {
        return Err(BotError::InsufficientData {
            required: config.period,
            available: candles.len(),
        });
    }

    let middle = moving_average(candles, config.ma_kind, config.period);
    let std_dev = rolling_std_dev(candles, config.period);
    let width = config.std_dev_multiplier * std_dev;

    let last = &candles[candles.len() - 1];
    Ok(BandSet {
        upper: middle + width,
        middle,
        lower: middle - width,
        timestamp: last.close_time,
    })
}

/// Compute a moving average of closing prices.
///
/// The kind set is closed; each kind dispatches to a single computation
/// function. Callers must ensure `candles.len() >= period`.
pub fn moving_average(candles: &[Candle], kind: MaKind, period: usize) -> f64 {
    match kind {
        MaKind::Sma => simple(candles, period),
        MaKind::Wma => weighted(candles, period),
        MaKind::Vwma => volume_weighted(candles, period),
        MaKind::Ema => smoothed(candles, period, 2.0 / (period as f64 + 1.0)),
        MaKind::Smma => smoothed(candles, period, 1.0 / period as f64),
    }
}

/// Trailing `period` candles of the series.
fn window(candles: &[Candle], period: usize) -> &[Candle] {
    &candles[candles.len() - period..]
}

/// Unweighted mean of closes over the window.
fn simple(candles: &[Candle], period: usize) -> f64 {
    let sum: f64 = window(candles, period).iter().map(|c| c.close).sum();
    sum / period as f64
}

/// Linearly weighted mean of closes, most recent candle weighted highest.
fn weighted(candles: &[Candle], period: usize) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for (i, candle) in window(candles, period).iter().enumerate() {
        let weight = (i + 1) as f64;
        weighted_sum += candle.close * weight;
        weight_total += weight;
    }
    weighted_sum / weight_total
}

/// Volume-weighted mean of closes. A zero-volume window falls back to the
/// unweighted mean.
fn volume_weighted(candles: &[Candle], period: usize) -> f64 {
    let win = window(candles, period);
    let volume_total: f64 = win.iter().map(|c| c.volume).sum();
    if volume_total <= 0.0 {
        return simple(candles, period);
    }
    let weighted_sum: f64 = win.iter().map(|c| c.close * c.volume).sum();
    weighted_sum / volume_total
}

/// Recursive single-pole smoothing over the full available window.
///
/// Seeded with the SMA of the first `period` closes, then folded over the
/// remainder of the series. Reproducible from a cold start given the same
/// input sequence.
fn smoothed(candles: &[Candle], period: usize, alpha: f64) -> f64 {
    let seed: f64 =
        candles.iter().take(period).map(|c| c.close).sum::<f64>() / period as f64;

    let mut value = seed;
    for candle in candles.iter().skip(period) {
        value = (candle.close - value) * alpha + value;
    }
    value
}

/// Sample standard deviation (ddof = 1) of closes over the trailing window.
fn rolling_std_dev(candles: &[Candle], period: usize) -> f64 {
    let win = window(candles, period);
    let mean = simple(candles, period);
    let variance: f64 = win
        .iter()
        .map(|c| (c.close - mean).powi(2))
        .sum::<f64>()
        / (period - 1) as f64;
    variance.sqrt()
}
