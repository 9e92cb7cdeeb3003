//! Core detection services: band calculation, wick-touch detection, signal
//! generation and the per-timeframe pipeline that wires them together.

pub mod bands;
pub mod history;
pub mod pipeline;
pub mod signals;
pub mod stats;
pub mod wick;

pub use history::CandleHistory;
pub use pipeline::{PipelineEvent, TimeframePipeline};
pub use signals::SignalEngine;
pub use stats::PipelineStats;
pub use wick::WickDetector;
