//! Sink integration: pipeline events drain into persistence after the
//! pipelines shut down, and repeated signal ids stay idempotent.

use std::sync::Arc;

use tokio::sync::mpsc;

use wicker::services::PipelineEvent;
use wicker::sinks::{run_sink, SignalStore};
use wicker::types::{
    BandLabel, Direction, Timeframe, TradingSignal, WickSide, WickTouch,
};

fn sample_signal(timestamp: i64) -> TradingSignal {
    TradingSignal {
        id: TradingSignal::make_id("SMA_9_0.1", Direction::Long, timestamp),
        symbol: "BTCUSDT".to_string(),
        config_name: "SMA_9_0.1".to_string(),
        direction: Direction::Long,
        entry_price: 100.0,
        band_value: 100.0,
        stop_loss: 70.0,
        take_profit: 120.0,
        confidence: 0.8,
        expected_profit: 24.8,
        band_label: BandLabel::Lower,
        touch_side: WickSide::Lower,
        timeframe: Timeframe::FiveMinutes,
        timestamp,
    }
}

fn sample_touch(timestamp: i64) -> WickTouch {
    WickTouch {
        config_name: "SMA_9_0.1".to_string(),
        band_label: BandLabel::Lower,
        side: WickSide::Lower,
        touch_price: 99.998,
        band_value: 100.0,
        distance: 2.0e-5,
        confidence: 0.8,
        timeframe: Timeframe::FiveMinutes,
        timestamp,
    }
}

#[tokio::test]
async fn test_sink_drains_all_events_before_stopping() {
    let store = Arc::new(SignalStore::new_in_memory().unwrap());
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    for i in 0..5 {
        event_tx
            .send(PipelineEvent::Touch(sample_touch(i * 1000)))
            .unwrap();
    }
    event_tx
        .send(PipelineEvent::Signal(sample_signal(1_700_000_000_000)))
        .unwrap();
    drop(event_tx);

    // The sink must consume everything already queued, then stop.
    run_sink(event_rx, store.clone(), None).await;

    assert_eq!(store.touch_count().unwrap(), 5);
    assert_eq!(store.signal_count().unwrap(), 1);
}

#[tokio::test]
async fn test_sink_reprocessed_signal_is_idempotent() {
    let store = Arc::new(SignalStore::new_in_memory().unwrap());
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    // Same deterministic id delivered twice.
    let signal = sample_signal(1_700_000_000_000);
    event_tx.send(PipelineEvent::Signal(signal.clone())).unwrap();
    event_tx.send(PipelineEvent::Signal(signal)).unwrap();
    drop(event_tx);

    run_sink(event_rx, store.clone(), None).await;

    assert_eq!(store.signal_count().unwrap(), 1);
    let persisted = store.recent_signals(10).unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].id, "SMA_9_0.1_LONG_1700000000");
    assert_eq!(persisted[0].direction, Direction::Long);
}
