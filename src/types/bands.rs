use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};

/// Moving-average kind used for the middle band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaKind {
    /// Simple moving average: unweighted mean.
    Sma,
    /// Weighted moving average: linearly increasing weights.
    Wma,
    /// Volume-weighted moving average.
    Vwma,
    /// Exponential moving average.
    Ema,
    /// Smoothed (Wilder) moving average.
    Smma,
}

impl MaKind {
    /// Parse from a configuration string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SMA" => Some(MaKind::Sma),
            "WMA" => Some(MaKind::Wma),
            "VWMA" => Some(MaKind::Vwma),
            "EMA" => Some(MaKind::Ema),
            "SMMA" => Some(MaKind::Smma),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MaKind::Sma => "SMA",
            MaKind::Wma => "WMA",
            MaKind::Vwma => "VWMA",
            MaKind::Ema => "EMA",
            MaKind::Smma => "SMMA",
        }
    }
}

/// One of the three band levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandLabel {
    Upper,
    Middle,
    Lower,
}

impl BandLabel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "upper" => Some(BandLabel::Upper),
            "middle" => Some(BandLabel::Middle),
            "lower" => Some(BandLabel::Lower),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BandLabel::Upper => "upper",
            BandLabel::Middle => "middle",
            BandLabel::Lower => "lower",
        }
    }
}

/// A named band configuration monitored by the pipeline.
///
/// Configurations are static, defined at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandConfig {
    pub ma_kind: MaKind,
    /// Look-back period in candles.
    pub period: usize,
    pub std_dev_multiplier: f64,
    /// The band this configuration trades against.
    pub band_label: BandLabel,
    /// Expected profit percentage from historical analysis, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_profit: Option<f64>,
}

impl BandConfig {
    pub fn new(
        ma_kind: MaKind,
        period: usize,
        std_dev_multiplier: f64,
        band_label: BandLabel,
    ) -> Self {
        Self {
            ma_kind,
            period,
            std_dev_multiplier,
            band_label,
            expected_profit: None,
        }
    }

    /// Canonical configuration name, e.g. "VWMA_12_0.1".
    pub fn name(&self) -> String {
        format!(
            "{}_{}_{}",
            self.ma_kind.as_str(),
            self.period,
            self.std_dev_multiplier
        )
    }

    /// Validate period and multiplier. Called once at startup.
    pub fn validate(&self) -> Result<()> {
        if self.period < 2 {
            return Err(BotError::InvalidConfiguration(format!(
                "{}: period must be at least 2",
                self.name()
            )));
        }
        if !self.std_dev_multiplier.is_finite() || self.std_dev_multiplier <= 0.0 {
            return Err(BotError::InvalidConfiguration(format!(
                "{}: standard-deviation multiplier must be positive",
                self.name()
            )));
        }
        if let Some(profit) = self.expected_profit {
            if !profit.is_finite() || profit <= 0.0 {
                return Err(BotError::InvalidConfiguration(format!(
                    "{}: expected profit must be positive",
                    self.name()
                )));
            }
        }
        Ok(())
    }
}

/// Upper/middle/lower levels for one configuration at one point in the
/// candle sequence. Derived data, recomputed on every candle update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandSet {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Close time (milliseconds) of the candle these levels apply to.
    pub timestamp: i64,
}

impl BandSet {
    /// Get the price level for a band label.
    pub fn level(&self, label: BandLabel) -> f64 {
        match label {
            BandLabel::Upper => self.upper,
            BandLabel::Middle => self.middle,
            BandLabel::Lower => self.lower,
        }
    }

    /// Valid band sets satisfy lower <= middle <= upper.
    pub fn is_ordered(&self) -> bool {
        self.lower <= self.middle && self.middle <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ma_kind_round_trip() {
        for kind in [
            MaKind::Sma,
            MaKind::Wma,
            MaKind::Vwma,
            MaKind::Ema,
            MaKind::Smma,
        ] {
            assert_eq!(MaKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(MaKind::from_str("hull"), None);
    }

    #[test]
    fn test_ma_kind_case_insensitive() {
        assert_eq!(MaKind::from_str("vwma"), Some(MaKind::Vwma));
        assert_eq!(MaKind::from_str("Smma"), Some(MaKind::Smma));
    }

    #[test]
    fn test_band_label_round_trip() {
        for label in [BandLabel::Upper, BandLabel::Middle, BandLabel::Lower] {
            assert_eq!(BandLabel::from_str(label.as_str()), Some(label));
        }
    }

    #[test]
    fn test_config_name() {
        let config = BandConfig::new(MaKind::Vwma, 12, 0.1, BandLabel::Middle);
        assert_eq!(config.name(), "VWMA_12_0.1");

        let config = BandConfig::new(MaKind::Sma, 20, 2.0, BandLabel::Lower);
        assert_eq!(config.name(), "SMA_20_2");
    }

    #[test]
    fn test_config_validate_ok() {
        let config = BandConfig::new(MaKind::Sma, 9, 0.1, BandLabel::Middle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_short_period() {
        let config = BandConfig::new(MaKind::Sma, 1, 0.1, BandLabel::Middle);
        assert!(matches!(
            config.validate().unwrap_err(),
            BotError::InvalidConfiguration(_)
        ));
    }

    #[test]
    fn test_config_rejects_non_positive_multiplier() {
        let config = BandConfig::new(MaKind::Wma, 43, 0.0, BandLabel::Middle);
        assert!(config.validate().is_err());

        let config = BandConfig::new(MaKind::Wma, 43, -0.1, BandLabel::Middle);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_band_set_level() {
        let bands = BandSet {
            upper: 101.0,
            middle: 100.0,
            lower: 99.0,
            timestamp: 0,
        };
        assert_eq!(bands.level(BandLabel::Upper), 101.0);
        assert_eq!(bands.level(BandLabel::Middle), 100.0);
        assert_eq!(bands.level(BandLabel::Lower), 99.0);
        assert!(bands.is_ordered());
        assert!((bands.width() - 2.0).abs() < 1e-12);
    }
}
