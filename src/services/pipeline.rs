//! Per-timeframe detection pipeline.
//!
//! Each monitored timeframe runs one pipeline: validate the candle update,
//! roll the history window, compute bands per configuration, detect wick
//! touches, and feed them to the signal engine. Finalized signals and
//! evaluated touches are pushed onto an unbounded outbound channel so slow
//! persistence or notification never stalls detection.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{BotError, Result};
use crate::services::bands;
use crate::services::history::CandleHistory;
use crate::services::signals::SignalEngine;
use crate::services::stats::PipelineStats;
use crate::services::wick::WickDetector;
use crate::types::{BandConfig, Candle, Timeframe, TradingSignal, WickTouch};

/// Outbound event handed to the sink task.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Every evaluated touch, for the audit log.
    Touch(WickTouch),
    /// A finalized signal.
    Signal(TradingSignal),
}

/// Detection pipeline for one timeframe stream.
///
/// Owns its history window, cooldown state and counters; shares nothing
/// mutable with other pipelines.
pub struct TimeframePipeline {
    timeframe: Timeframe,
    history: CandleHistory,
    configs: Vec<BandConfig>,
    detector: WickDetector,
    engine: SignalEngine,
    /// Minimum age (ms) before a live candle becomes signal-eligible.
    /// Zero means only closed candles are eligible.
    live_min_age_ms: i64,
    event_tx: mpsc::UnboundedSender<PipelineEvent>,
    stats: Arc<PipelineStats>,
}

impl TimeframePipeline {
    pub fn new(
        timeframe: Timeframe,
        config: &Config,
        event_tx: mpsc::UnboundedSender<PipelineEvent>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        let engine = SignalEngine::new(
            config.symbol.clone(),
            config.confidence_threshold,
            config.cooldown_secs,
            config.stop_loss_fraction,
            config.take_profit_fraction,
            stats.clone(),
        );

        Self {
            timeframe,
            history: CandleHistory::new(timeframe, config.history_limit),
            configs: config.band_configs.clone(),
            detector: WickDetector::new(config.tolerance),
            engine,
            live_min_age_ms: config.live_min_age_ms,
            event_tx,
            stats,
        }
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        self.stats.clone()
    }

    /// Process one candle update to completion. Returns the signals emitted
    /// for this update.
    ///
    /// Malformed candles propagate as `MalformedCandle`; the caller drops
    /// the update and continues. An `InsufficientData` failure for one
    /// configuration only skips that configuration.
    pub fn process(&mut self, candle: Candle, now_ms: i64) -> Result<Vec<TradingSignal>> {
        self.history.apply(candle.clone())?;
        PipelineStats::incr(&self.stats.candles_processed);

        if !self.signal_eligible(&candle, now_ms) {
            return Ok(Vec::new());
        }

        let series = self.history.series();
        let mut emitted = Vec::new();

        for config in &self.configs {
            let band_set = match bands::compute_bands(&series, config) {
                Ok(b) => b,
                Err(BotError::InsufficientData {
                    required,
                    available,
                }) => {
                    debug!(
                        "[{}] {}: skipped, {} candles required, {} available",
                        self.timeframe.as_str(),
                        config.name(),
                        required,
                        available
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };
            debug_assert!(band_set.is_ordered());

            for touch in self.detector.detect_touches(&candle, &band_set, config) {
                PipelineStats::incr(&self.stats.touches_detected);
                debug!(
                    "[{}] {} touch on {} band at {:.2} (confidence {:.2})",
                    self.timeframe.as_str(),
                    touch.side.as_str(),
                    touch.band_label.as_str(),
                    touch.touch_price,
                    touch.confidence,
                );
                self.dispatch(PipelineEvent::Touch(touch.clone()));

                if let Some(signal) = self.engine.evaluate(&touch, config, &series, now_ms) {
                    self.dispatch(PipelineEvent::Signal(signal.clone()));
                    emitted.push(signal);
                }
            }
        }

        Ok(emitted)
    }

    /// Closed candles are always eligible for touch detection. Live candles
    /// are eligible only when a staleness window is configured and the
    /// candle has been open at least that long.
    fn signal_eligible(&self, candle: &Candle, now_ms: i64) -> bool {
        if candle.is_closed {
            return true;
        }
        self.live_min_age_ms > 0 && now_ms - candle.open_time >= self.live_min_age_ms
    }

    fn dispatch(&self, event: PipelineEvent) {
        // The receiver only drops at shutdown; losing audit events then is
        // acceptable.
        if self.event_tx.send(event).is_err() {
            warn!(
                "[{}] outbound channel closed, event dropped",
                self.timeframe.as_str()
            );
        }
    }

    /// Consume candle updates until the feed channel closes. Each update
    /// runs to completion before the next is accepted.
    pub async fn run(mut self, mut candle_rx: mpsc::Receiver<Candle>) {
        info!("[{}] pipeline started", self.timeframe.as_str());

        while let Some(candle) = candle_rx.recv().await {
            let now_ms = chrono::Utc::now().timestamp_millis();
            match self.process(candle, now_ms) {
                Ok(_) => {}
                Err(BotError::MalformedCandle(msg)) => {
                    PipelineStats::incr(&self.stats.candles_dropped);
                    warn!(
                        "[{}] dropped malformed candle: {}",
                        self.timeframe.as_str(),
                        msg
                    );
                }
                Err(e) => {
                    error!("[{}] pipeline error: {}", self.timeframe.as_str(), e);
                }
            }
        }

        info!("[{}] pipeline stopped", self.timeframe.as_str());
    }
}
