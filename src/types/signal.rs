use serde::{Deserialize, Serialize};

use crate::types::{BandLabel, Timeframe, WickSide};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LONG" => Some(Direction::Long),
            "SHORT" => Some(Direction::Short),
            _ => None,
        }
    }
}

/// A finalized trading signal, ready for notification and persistence.
///
/// Immutable after creation. The id is derived deterministically from the
/// configuration, direction and emission time, so reprocessing the same
/// signal is idempotent for external logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingSignal {
    pub id: String,
    pub symbol: String,
    pub config_name: String,
    pub direction: Direction,
    pub entry_price: f64,
    /// The band level whose touch produced this signal.
    pub band_value: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Expected profit percentage for the originating configuration.
    pub expected_profit: f64,
    pub band_label: BandLabel,
    pub touch_side: WickSide,
    pub timeframe: Timeframe,
    /// Unix timestamp (milliseconds) at emission.
    pub timestamp: i64,
}

impl TradingSignal {
    /// Deterministic signal id: configuration, direction and emission time
    /// in whole seconds.
    pub fn make_id(config_name: &str, direction: Direction, timestamp_ms: i64) -> String {
        format!(
            "{}_{}_{}",
            config_name,
            direction.as_str(),
            timestamp_ms / 1000
        )
    }

    /// Stop-loss distance from entry as a signed percentage.
    pub fn stop_loss_pct(&self) -> f64 {
        (self.stop_loss / self.entry_price - 1.0) * 100.0
    }

    /// Take-profit distance from entry as a signed percentage.
    pub fn take_profit_pct(&self) -> f64 {
        (self.take_profit / self.entry_price - 1.0) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal() -> TradingSignal {
        TradingSignal {
            id: TradingSignal::make_id("VWMA_12_0.1", Direction::Long, 1_700_000_000_000),
            symbol: "BTCUSDT".to_string(),
            config_name: "VWMA_12_0.1".to_string(),
            direction: Direction::Long,
            entry_price: 42150.5,
            band_value: 42148.3,
            stop_loss: 42150.5 * 0.7,
            take_profit: 42150.5 * 1.2,
            confidence: 0.85,
            expected_profit: 28.51,
            band_label: BandLabel::Middle,
            touch_side: WickSide::Lower,
            timeframe: Timeframe::FiveMinutes,
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_direction_round_trip() {
        assert_eq!(Direction::from_str("LONG"), Some(Direction::Long));
        assert_eq!(Direction::from_str("short"), Some(Direction::Short));
        assert_eq!(Direction::from_str("flat"), None);
    }

    #[test]
    fn test_make_id_deterministic() {
        let a = TradingSignal::make_id("SMA_9_0.1", Direction::Short, 1_700_000_000_123);
        let b = TradingSignal::make_id("SMA_9_0.1", Direction::Short, 1_700_000_000_999);
        // Same second, same id.
        assert_eq!(a, b);
        assert_eq!(a, "SMA_9_0.1_SHORT_1700000000");
    }

    #[test]
    fn test_risk_percentages() {
        let s = signal();
        assert!((s.stop_loss_pct() + 30.0).abs() < 1e-9);
        assert!((s.take_profit_pct() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_signal_serializes_flat_record() {
        let s = signal();
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"entryPrice\""));
        assert!(json.contains("\"stopLoss\""));
        assert!(json.contains("\"takeProfit\""));
        assert!(json.contains("\"direction\":\"LONG\""));
        assert!(json.contains("\"expectedProfit\""));

        let back: TradingSignal = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, s.id);
        assert_eq!(back.direction, Direction::Long);
    }
}
