use serde::{Deserialize, Serialize};

use crate::types::{BandLabel, Timeframe};

/// Which candle extreme produced a touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WickSide {
    /// The candle high tested against a band.
    Upper,
    /// The candle low tested against a band.
    Lower,
}

impl WickSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            WickSide::Upper => "upper_wick",
            WickSide::Lower => "lower_wick",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "upper_wick" => Some(WickSide::Upper),
            "lower_wick" => Some(WickSide::Lower),
            _ => None,
        }
    }
}

/// A wick extreme landing within tolerance of a band level.
///
/// Created by the wick detector, consumed once by the signal engine, then
/// handed to the audit log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WickTouch {
    /// Name of the originating band configuration.
    pub config_name: String,
    pub band_label: BandLabel,
    pub side: WickSide,
    /// The candle extreme that touched.
    pub touch_price: f64,
    /// The band level it touched.
    pub band_value: f64,
    /// Relative distance |extreme - band| / band.
    pub distance: f64,
    /// Confidence in [0, 1]: 1.0 at an exact touch, 0.0 at the tolerance
    /// boundary.
    pub confidence: f64,
    pub timeframe: Timeframe,
    /// Close time (milliseconds) of the touching candle.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wick_side_round_trip() {
        assert_eq!(WickSide::from_str("upper_wick"), Some(WickSide::Upper));
        assert_eq!(WickSide::from_str("lower_wick"), Some(WickSide::Lower));
        assert_eq!(WickSide::from_str("middle"), None);
    }

    #[test]
    fn test_touch_serializes_camel_case() {
        let touch = WickTouch {
            config_name: "SMA_9_0.1".to_string(),
            band_label: BandLabel::Middle,
            side: WickSide::Lower,
            touch_price: 42148.3,
            band_value: 42150.0,
            distance: 4.0e-5,
            confidence: 0.6,
            timeframe: Timeframe::FiveMinutes,
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_string(&touch).unwrap();
        assert!(json.contains("\"configName\""));
        assert!(json.contains("\"bandLabel\":\"middle\""));
        assert!(json.contains("\"side\":\"lower\""));
    }
}
