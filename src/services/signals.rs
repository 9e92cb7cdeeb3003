//! Signal generation from wick touches.
//!
//! Applies confidence and cooldown filters, infers trade direction, and
//! assembles finalized signals with stop-loss/take-profit levels. Cooldown
//! state lives here, keyed per (configuration, direction), and is mutated
//! only on successful emission.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::services::stats::PipelineStats;
use crate::types::{BandConfig, BandLabel, Candle, Direction, TradingSignal, WickSide, WickTouch};

/// Default minimum confidence for a touch to produce a signal.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.70;

/// Default cooldown between signals for the same configuration and
/// direction, in seconds.
pub const DEFAULT_COOLDOWN_SECS: u64 = 3600;

/// Default stop-loss fraction of entry price.
pub const DEFAULT_STOP_LOSS_FRACTION: f64 = 0.30;

/// Default take-profit fraction of entry price.
pub const DEFAULT_TAKE_PROFIT_FRACTION: f64 = 0.20;

/// Number of trailing closes used to resolve middle-band touch direction.
const TREND_WINDOW: usize = 5;

/// Converts accepted wick touches into trading signals.
pub struct SignalEngine {
    symbol: String,
    confidence_threshold: f64,
    cooldown_ms: i64,
    stop_loss_fraction: f64,
    take_profit_fraction: f64,
    /// Last emission time (ms) per (configuration name, direction).
    cooldowns: HashMap<(String, Direction), i64>,
    stats: Arc<PipelineStats>,
}

impl SignalEngine {
    pub fn new(
        symbol: String,
        confidence_threshold: f64,
        cooldown_secs: u64,
        stop_loss_fraction: f64,
        take_profit_fraction: f64,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            symbol,
            confidence_threshold,
            cooldown_ms: cooldown_secs as i64 * 1000,
            stop_loss_fraction,
            take_profit_fraction,
            cooldowns: HashMap::new(),
            stats,
        }
    }

    /// Evaluate one touch. Returns a finalized signal when the touch passes
    /// the band, confidence and cooldown filters; otherwise the touch is
    /// dropped silently and counted.
    ///
    /// `candles` is the series that produced the touch; the last candle's
    /// close is the entry price. `now_ms` is the emission timestamp.
    pub fn evaluate(
        &mut self,
        touch: &WickTouch,
        config: &BandConfig,
        candles: &[Candle],
        now_ms: i64,
    ) -> Option<TradingSignal> {
        // Only touches on the configuration's target band are tradable.
        if touch.band_label != config.band_label {
            PipelineStats::incr(&self.stats.touches_dropped_off_band);
            return None;
        }

        if touch.confidence < self.confidence_threshold {
            PipelineStats::incr(&self.stats.touches_dropped_confidence);
            debug!(
                "{}: touch confidence {:.2} below threshold {:.2}",
                touch.config_name, touch.confidence, self.confidence_threshold
            );
            return None;
        }

        let entry_price = candles.last()?.close;
        let direction = infer_direction(touch, candles);

        if self.in_cooldown(&touch.config_name, direction, now_ms) {
            PipelineStats::incr(&self.stats.touches_dropped_cooldown);
            debug!(
                "{}: {} signal suppressed by cooldown",
                touch.config_name,
                direction.as_str()
            );
            return None;
        }

        let (stop_loss, take_profit) = self.risk_levels(entry_price, direction);
        let expected_profit = config
            .expected_profit
            .unwrap_or(self.take_profit_fraction * 100.0);

        let signal = TradingSignal {
            id: TradingSignal::make_id(&touch.config_name, direction, now_ms),
            symbol: self.symbol.clone(),
            config_name: touch.config_name.clone(),
            direction,
            entry_price,
            band_value: touch.band_value,
            stop_loss,
            take_profit,
            confidence: touch.confidence,
            expected_profit,
            band_label: touch.band_label,
            touch_side: touch.side,
            timeframe: touch.timeframe,
            timestamp: now_ms,
        };

        self.cooldowns
            .insert((touch.config_name.clone(), direction), now_ms);
        PipelineStats::incr(&self.stats.signals_emitted);
        info!(
            "new signal {}: {} {} @ {:.2} (sl {:.2}, tp {:.2}, confidence {:.2})",
            signal.id,
            signal.direction.as_str(),
            signal.symbol,
            signal.entry_price,
            signal.stop_loss,
            signal.take_profit,
            signal.confidence,
        );

        Some(signal)
    }

    /// Whether the (configuration, direction) pair is still cooling down.
    fn in_cooldown(&self, config_name: &str, direction: Direction, now_ms: i64) -> bool {
        match self.cooldowns.get(&(config_name.to_string(), direction)) {
            Some(&last) => now_ms - last < self.cooldown_ms,
            None => false,
        }
    }

    /// Stop-loss and take-profit levels around the entry price.
    fn risk_levels(&self, entry_price: f64, direction: Direction) -> (f64, f64) {
        match direction {
            Direction::Long => (
                entry_price * (1.0 - self.stop_loss_fraction),
                entry_price * (1.0 + self.take_profit_fraction),
            ),
            Direction::Short => (
                entry_price * (1.0 + self.stop_loss_fraction),
                entry_price * (1.0 - self.take_profit_fraction),
            ),
        }
    }
}

/// Infer trade direction from the touched band and wick side.
///
/// Lower-band touches favor long entries, upper-band touches short entries.
/// Middle-band touches are ambiguous; the trend of recent closes
/// disambiguates (close-to-close slope over the last `TREND_WINDOW`
/// closes), falling back to the wick side when the slope is flat.
fn infer_direction(touch: &WickTouch, candles: &[Candle]) -> Direction {
    match touch.band_label {
        BandLabel::Lower => Direction::Long,
        BandLabel::Upper => Direction::Short,
        BandLabel::Middle => trend_direction(candles).unwrap_or(match touch.side {
            WickSide::Lower => Direction::Long,
            WickSide::Upper => Direction::Short,
        }),
    }
}

/// Sign of the close slope over the trailing trend window. None when flat
/// or when fewer than two closes are available.
fn trend_direction(candles: &[Candle]) -> Option<Direction> {
    let len = candles.len();
    if len < 2 {
        return None;
    }
    let window = &candles[len.saturating_sub(TREND_WINDOW)..];
    let first = window.first()?.close;
    let last = window.last()?.close;
    if last > first {
        Some(Direction::Long)
    } else if last < first {
        Some(Direction::Short)
    } else {
        None
    }
}
