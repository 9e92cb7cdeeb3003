//! Rolling candle history for one timeframe stream.
//!
//! Closed candles accumulate in a bounded window; the in-progress live
//! candle sits in its own slot and is replaced in place on every interim
//! update until it closes.

use std::collections::VecDeque;

use crate::error::Result;
use crate::types::{Candle, Timeframe};

/// Default number of closed candles retained per timeframe.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Bounded rolling window of candles for one timeframe.
#[derive(Debug)]
pub struct CandleHistory {
    timeframe: Timeframe,
    closed: VecDeque<Candle>,
    live: Option<Candle>,
    max_len: usize,
}

impl CandleHistory {
    pub fn new(timeframe: Timeframe, max_len: usize) -> Self {
        Self {
            timeframe,
            closed: VecDeque::with_capacity(max_len),
            live: None,
            max_len,
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Number of closed candles in the window.
    pub fn len(&self) -> usize {
        self.closed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closed.is_empty()
    }

    /// Apply a candle update.
    ///
    /// Closed candles append to the window, clearing a live candle for the
    /// same open time. Live candles replace the live slot. Malformed
    /// candles are rejected before any state changes.
    pub fn apply(&mut self, candle: Candle) -> Result<()> {
        candle.validate()?;

        if candle.is_closed {
            if let Some(ref live) = self.live {
                if live.open_time == candle.open_time {
                    self.live = None;
                }
            }
            self.closed.push_back(candle);
            while self.closed.len() > self.max_len {
                self.closed.pop_front();
            }
        } else {
            self.live = Some(candle);
        }
        Ok(())
    }

    /// The closed window plus the live candle when present, oldest first.
    pub fn series(&self) -> Vec<Candle> {
        let mut out: Vec<Candle> = self.closed.iter().cloned().collect();
        if let Some(ref live) = self.live {
            out.push(live.clone());
        }
        out
    }

    /// The closed window only, oldest first.
    pub fn closed_series(&self) -> Vec<Candle> {
        self.closed.iter().cloned().collect()
    }

    /// The current live candle, if any.
    pub fn live(&self) -> Option<&Candle> {
        self.live.as_ref()
    }

    /// The most recent closed candle.
    pub fn latest_closed(&self) -> Option<&Candle> {
        self.closed.back()
    }
}
