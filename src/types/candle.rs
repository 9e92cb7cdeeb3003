use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};

/// Candle interval for a monitored stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
}

impl Timeframe {
    /// Parse from an interval string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(Timeframe::OneMinute),
            "5m" => Some(Timeframe::FiveMinutes),
            "15m" => Some(Timeframe::FifteenMinutes),
            "1h" => Some(Timeframe::OneHour),
            _ => None,
        }
    }

    /// Get the interval string used by the exchange stream.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneMinute => "1m",
            Timeframe::FiveMinutes => "5m",
            Timeframe::FifteenMinutes => "15m",
            Timeframe::OneHour => "1h",
        }
    }

    /// Get the candle duration in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        match self {
            Timeframe::OneMinute => 60_000,
            Timeframe::FiveMinutes => 300_000,
            Timeframe::FifteenMinutes => 900_000,
            Timeframe::OneHour => 3_600_000,
        }
    }
}

/// A single OHLCV candle.
///
/// Closed candles are immutable. The most recent candle of a stream may be
/// live (`is_closed == false`) and is replaced in place until it closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Unix timestamp (milliseconds) when this candle opened.
    pub open_time: i64,
    /// Unix timestamp (milliseconds) when this candle closes.
    pub close_time: i64,
    pub timeframe: Timeframe,
    pub is_closed: bool,
}

impl Candle {
    /// Check OHLCV integrity. A candle with non-finite fields or inverted
    /// extremes is malformed and must be dropped by the caller.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(BotError::MalformedCandle(format!(
                    "{} is not finite: {}",
                    name, value
                )));
            }
        }
        if self.volume < 0.0 {
            return Err(BotError::MalformedCandle(format!(
                "negative volume: {}",
                self.volume
            )));
        }
        if self.high < self.low {
            return Err(BotError::MalformedCandle(format!(
                "high {} below low {}",
                self.high, self.low
            )));
        }
        if self.high < self.open.max(self.close) || self.low > self.open.min(self.close) {
            return Err(BotError::MalformedCandle(
                "open/close outside high/low range".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn body_size(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn total_range(&self) -> f64 {
        self.high - self.low
    }

    /// Length of the wick above the candle body.
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// Length of the wick below the candle body.
    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// Upper wick length as a fraction of the candle's total range.
    pub fn upper_wick_ratio(&self) -> f64 {
        let range = self.total_range();
        if range > 0.0 {
            self.upper_wick() / range
        } else {
            0.0
        }
    }

    /// Lower wick length as a fraction of the candle's total range.
    pub fn lower_wick_ratio(&self) -> f64 {
        let range = self.total_range();
        if range > 0.0 {
            self.lower_wick() / range
        } else {
            0.0
        }
    }

    /// Body size as a fraction of the candle's total range.
    pub fn body_to_range_ratio(&self) -> f64 {
        let range = self.total_range();
        if range > 0.0 {
            self.body_size() / range
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            open,
            high,
            low,
            close,
            volume: 10.0,
            open_time: 0,
            close_time: 300_000,
            timeframe: Timeframe::FiveMinutes,
            is_closed: true,
        }
    }

    #[test]
    fn test_timeframe_round_trip() {
        for tf in [
            Timeframe::OneMinute,
            Timeframe::FiveMinutes,
            Timeframe::FifteenMinutes,
            Timeframe::OneHour,
        ] {
            assert_eq!(Timeframe::from_str(tf.as_str()), Some(tf));
        }
        assert_eq!(Timeframe::from_str("3d"), None);
    }

    #[test]
    fn test_timeframe_duration() {
        assert_eq!(Timeframe::FiveMinutes.duration_ms(), 300_000);
        assert_eq!(Timeframe::OneHour.duration_ms(), 3_600_000);
    }

    #[test]
    fn test_validate_ok() {
        assert!(candle(100.0, 101.0, 99.0, 100.5).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_nan() {
        let c = candle(100.0, f64::NAN, 99.0, 100.5);
        let err = c.validate().unwrap_err();
        assert!(matches!(err, BotError::MalformedCandle(_)));
    }

    #[test]
    fn test_validate_rejects_inverted_extremes() {
        let c = candle(100.0, 99.0, 101.0, 100.0);
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_body_outside_range() {
        let mut c = candle(100.0, 101.0, 99.0, 100.5);
        c.close = 102.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_volume() {
        let mut c = candle(100.0, 101.0, 99.0, 100.5);
        c.volume = -1.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_wick_lengths_bullish() {
        // Bullish: body from 100 to 100.5, high 101, low 99.
        let c = candle(100.0, 101.0, 99.0, 100.5);
        assert!(c.is_bullish());
        assert!((c.upper_wick() - 0.5).abs() < 1e-12);
        assert!((c.lower_wick() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_wick_lengths_bearish() {
        let c = candle(100.5, 101.0, 99.0, 100.0);
        assert!(!c.is_bullish());
        assert!((c.upper_wick() - 0.5).abs() < 1e-12);
        assert!((c.lower_wick() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratios_sum_to_one() {
        let c = candle(100.0, 101.0, 99.0, 100.5);
        let total = c.body_to_range_ratio() + c.upper_wick_ratio() + c.lower_wick_ratio();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratios_zero_range() {
        let c = candle(100.0, 100.0, 100.0, 100.0);
        assert_eq!(c.body_to_range_ratio(), 0.0);
        assert_eq!(c.upper_wick_ratio(), 0.0);
    }
}
