//! Wick-touch detection against band levels.
//!
//! The candle high is tested against the upper and middle bands, the candle
//! low against the lower and middle bands. A touch registers when the
//! relative distance between the extreme and the band level is within
//! tolerance, and each side produces at most one touch: when an extreme
//! satisfies tolerance for more than one band, only the closest survives.

use crate::types::{BandConfig, BandLabel, BandSet, Candle, WickSide, WickTouch};

/// Default relative tolerance: +/- 0.01%.
pub const DEFAULT_TOLERANCE: f64 = 0.0001;

/// Detects candle-wick touches on Bollinger Bands.
#[derive(Debug, Clone)]
pub struct WickDetector {
    tolerance: f64,
}

impl WickDetector {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Detect touches for one candle against one band set.
    ///
    /// Returns at most one touch per wick side.
    pub fn detect_touches(
        &self,
        candle: &Candle,
        bands: &BandSet,
        config: &BandConfig,
    ) -> Vec<WickTouch> {
        let mut touches = Vec::with_capacity(2);

        let upper_candidates = [
            (BandLabel::Upper, bands.upper),
            (BandLabel::Middle, bands.middle),
        ];
        if let Some(touch) =
            self.closest_touch(candle, config, WickSide::Upper, candle.high, &upper_candidates)
        {
            touches.push(touch);
        }

        let lower_candidates = [
            (BandLabel::Lower, bands.lower),
            (BandLabel::Middle, bands.middle),
        ];
        if let Some(touch) =
            self.closest_touch(candle, config, WickSide::Lower, candle.low, &lower_candidates)
        {
            touches.push(touch);
        }

        touches
    }

    /// Pick the in-tolerance candidate band with the smallest normalized
    /// distance. Candidates are ordered outer band first, so an exact tie
    /// resolves to the outer band.
    fn closest_touch(
        &self,
        candle: &Candle,
        config: &BandConfig,
        side: WickSide,
        extreme: f64,
        candidates: &[(BandLabel, f64)],
    ) -> Option<WickTouch> {
        let mut best: Option<(BandLabel, f64, f64)> = None;

        for &(label, level) in candidates {
            let distance = match relative_distance(extreme, level) {
                Some(d) => d,
                None => continue,
            };
            if distance > self.tolerance {
                continue;
            }
            if best.map_or(true, |(_, _, d)| distance < d) {
                best = Some((label, level, distance));
            }
        }

        best.map(|(band_label, band_value, distance)| WickTouch {
            config_name: config.name(),
            band_label,
            side,
            touch_price: extreme,
            band_value,
            distance,
            confidence: self.confidence(distance),
            timeframe: candle.timeframe,
            timestamp: candle.close_time,
        })
    }

    /// Linear confidence mapping: 1.0 at zero distance, 0.0 at the
    /// tolerance boundary, monotonically decreasing in between.
    fn confidence(&self, distance: f64) -> f64 {
        (1.0 - distance / self.tolerance).clamp(0.0, 1.0)
    }
}

impl Default for WickDetector {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

/// Relative distance |price - level| / level. None for non-positive or
/// non-finite levels, which can never be touched.
fn relative_distance(price: f64, level: f64) -> Option<f64> {
    if !level.is_finite() || level <= 0.0 {
        return None;
    }
    Some((price - level).abs() / level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MaKind, Timeframe};

    fn candle(high: f64, low: f64) -> Candle {
        let mid = (high + low) / 2.0;
        Candle {
            open: mid,
            high,
            low,
            close: mid,
            volume: 10.0,
            open_time: 0,
            close_time: 299_999,
            timeframe: Timeframe::FiveMinutes,
            is_closed: true,
        }
    }

    fn config() -> BandConfig {
        BandConfig::new(MaKind::Sma, 9, 0.1, BandLabel::Middle)
    }

    fn bands(upper: f64, middle: f64, lower: f64) -> BandSet {
        BandSet {
            upper,
            middle,
            lower,
            timestamp: 299_999,
        }
    }

    #[test]
    fn test_exact_touch_full_confidence() {
        let detector = WickDetector::default();
        let touches =
            detector.detect_touches(&candle(101.0, 100.0), &bands(101.0, 100.5, 100.0), &config());
        assert_eq!(touches.len(), 2);

        let upper = touches.iter().find(|t| t.side == WickSide::Upper).unwrap();
        assert_eq!(upper.band_label, BandLabel::Upper);
        assert_eq!(upper.confidence, 1.0);
        assert_eq!(upper.distance, 0.0);

        let lower = touches.iter().find(|t| t.side == WickSide::Lower).unwrap();
        assert_eq!(lower.band_label, BandLabel::Lower);
        assert_eq!(lower.confidence, 1.0);
    }

    #[test]
    fn test_no_touch_beyond_tolerance() {
        let detector = WickDetector::default();
        // High is 0.05% above the upper band, five times the tolerance.
        let touches =
            detector.detect_touches(&candle(100.55, 99.0), &bands(100.5, 100.0, 99.5), &config());
        assert!(touches.is_empty());
    }

    #[test]
    fn test_confidence_decreases_with_distance() {
        let detector = WickDetector::default();
        // 0.005% away from the 100.0 lower band: half the tolerance.
        let touches =
            detector.detect_touches(&candle(102.0, 100.005), &bands(104.0, 103.0, 100.0), &config());
        assert_eq!(touches.len(), 1);
        let touch = &touches[0];
        assert_eq!(touch.side, WickSide::Lower);
        assert!((touch.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_zero_at_boundary() {
        let detector = WickDetector::new(0.01);
        // Exactly at the tolerance boundary: high of 101 against a band at
        // 100 with a 1% tolerance.
        let touches =
            detector.detect_touches(&candle(101.0, 99.0), &bands(100.0, 99.5, 99.0), &config());
        let upper = touches.iter().find(|t| t.side == WickSide::Upper).unwrap();
        assert_eq!(upper.band_label, BandLabel::Upper);
        assert!(upper.confidence.abs() < 1e-9);
    }

    #[test]
    fn test_at_most_one_touch_per_side() {
        let detector = WickDetector::new(0.01);
        // Pathologically tight bands: both upper and middle within tolerance
        // of the high. Only the closest (middle) must survive.
        let touches =
            detector.detect_touches(&candle(100.1, 95.0), &bands(100.5, 100.2, 99.9), &config());
        let upper: Vec<_> = touches.iter().filter(|t| t.side == WickSide::Upper).collect();
        assert_eq!(upper.len(), 1);
        assert_eq!(upper[0].band_label, BandLabel::Middle);
    }

    #[test]
    fn test_collapsed_bands_tie_prefers_outer() {
        let detector = WickDetector::default();
        // Zero-volatility bands: all three levels equal. The lower-side tie
        // between lower and middle resolves to the outer band.
        let touches =
            detector.detect_touches(&candle(100.5, 100.0), &bands(100.0, 100.0, 100.0), &config());
        let lower = touches.iter().find(|t| t.side == WickSide::Lower).unwrap();
        assert_eq!(lower.band_label, BandLabel::Lower);
    }

    #[test]
    fn test_middle_band_touchable_from_both_sides() {
        let detector = WickDetector::default();
        let b = bands(110.0, 100.0, 90.0);
        // High touches middle from below.
        let touches = detector.detect_touches(&candle(100.0, 95.0), &b, &config());
        assert_eq!(touches.len(), 1);
        assert_eq!(touches[0].side, WickSide::Upper);
        assert_eq!(touches[0].band_label, BandLabel::Middle);

        // Low touches middle from above.
        let touches = detector.detect_touches(&candle(105.0, 100.0), &b, &config());
        assert_eq!(touches.len(), 1);
        assert_eq!(touches[0].side, WickSide::Lower);
        assert_eq!(touches[0].band_label, BandLabel::Middle);
    }

    #[test]
    fn test_non_positive_band_never_touches() {
        let detector = WickDetector::default();
        let touches =
            detector.detect_touches(&candle(0.1, 0.0), &bands(0.1, 0.0, -0.1), &config());
        let lower_side: Vec<_> = touches.iter().filter(|t| t.side == WickSide::Lower).collect();
        assert!(lower_side.is_empty());
    }
}
