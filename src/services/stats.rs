//! Diagnostic counters for a pipeline.
//!
//! Dropped touches are never errors; they are reported here as counts only.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::types::Timeframe;

/// Shared counters for one timeframe pipeline.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub candles_processed: AtomicU64,
    pub candles_dropped: AtomicU64,
    pub touches_detected: AtomicU64,
    pub touches_dropped_confidence: AtomicU64,
    pub touches_dropped_cooldown: AtomicU64,
    pub touches_dropped_off_band: AtomicU64,
    pub signals_emitted: AtomicU64,
}

impl PipelineStats {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    /// Log a one-line status summary for this pipeline.
    pub fn log_status(&self, timeframe: Timeframe) {
        info!(
            "[{}] candles: {} ({} dropped), touches: {} ({} low-confidence, {} cooldown, {} off-band), signals: {}",
            timeframe.as_str(),
            Self::get(&self.candles_processed),
            Self::get(&self.candles_dropped),
            Self::get(&self.touches_detected),
            Self::get(&self.touches_dropped_confidence),
            Self::get(&self.touches_dropped_cooldown),
            Self::get(&self.touches_dropped_off_band),
            Self::get(&self.signals_emitted),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = PipelineStats::default();
        assert_eq!(PipelineStats::get(&stats.candles_processed), 0);
        assert_eq!(PipelineStats::get(&stats.signals_emitted), 0);
    }

    #[test]
    fn test_incr() {
        let stats = PipelineStats::default();
        PipelineStats::incr(&stats.touches_detected);
        PipelineStats::incr(&stats.touches_detected);
        assert_eq!(PipelineStats::get(&stats.touches_detected), 2);
    }
}
