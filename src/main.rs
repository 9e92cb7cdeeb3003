use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wicker::config::Config;
use wicker::services::{PipelineStats, TimeframePipeline};
use wicker::sinks::{self, DiscordNotifier, SignalStore};
use wicker::sources::BinanceKlineStream;
use wicker::types::{Candle, Timeframe};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wicker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load and validate configuration; invalid configuration is fatal.
    let config = Arc::new(Config::from_env()?);
    info!(
        "starting wicker for {} on {:?}",
        config.symbol,
        config
            .timeframes
            .iter()
            .map(Timeframe::as_str)
            .collect::<Vec<_>>()
    );
    for band_config in &config.band_configs {
        info!(
            "monitoring {} ({} band, tolerance {:.4}%)",
            band_config.name(),
            band_config.band_label.as_str(),
            config.tolerance * 100.0
        );
    }

    // Persistence and notification sinks.
    let store = Arc::new(SignalStore::new(&config.db_path)?);
    let notifier = config.discord_webhook_url.clone().map(|url| {
        info!("Discord webhook configured, alerts enabled");
        DiscordNotifier::new(url)
    });

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let sink_handle = tokio::spawn(sinks::run_sink(event_rx, store.clone(), notifier));

    // One pipeline task per timeframe; pipelines share no mutable state.
    let mut candle_txs: HashMap<Timeframe, mpsc::Sender<Candle>> = HashMap::new();
    let mut pipeline_handles = Vec::new();
    let mut pipeline_stats: Vec<(Timeframe, Arc<PipelineStats>)> = Vec::new();

    for timeframe in &config.timeframes {
        let (candle_tx, candle_rx) = mpsc::channel(256);
        candle_txs.insert(*timeframe, candle_tx);

        let stats = Arc::new(PipelineStats::default());
        pipeline_stats.push((*timeframe, stats.clone()));

        let pipeline = TimeframePipeline::new(*timeframe, &config, event_tx.clone(), stats);
        pipeline_handles.push(tokio::spawn(pipeline.run(candle_rx)));
    }
    drop(event_tx);

    // Seed history, then stream live updates.
    let stream = BinanceKlineStream::new(config.symbol.clone(), candle_txs);
    stream.backfill(config.history_limit).await;
    let stream_handle = tokio::spawn(async move {
        stream.connect().await;
    });

    // Periodic status summary.
    let status_interval = config.status_interval_secs;
    let status_stats = pipeline_stats.clone();
    let status_handle = tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(status_interval));
        interval.tick().await; // immediate first tick
        loop {
            interval.tick().await;
            for (timeframe, stats) in &status_stats {
                stats.log_status(*timeframe);
            }
        }
    });

    info!("wicker started, watching for band wick touches");

    // Graceful shutdown: stop the feed first, let pipelines drain their
    // queues and finish in-flight candles, then let the sink drain.
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    stream_handle.abort();
    status_handle.abort();

    for handle in pipeline_handles {
        if let Err(e) = handle.await {
            if !e.is_cancelled() {
                error!("pipeline task failed: {}", e);
            }
        }
    }
    if let Err(e) = sink_handle.await {
        if !e.is_cancelled() {
            error!("sink task failed: {}", e);
        }
    }

    for (timeframe, stats) in &pipeline_stats {
        stats.log_status(*timeframe);
    }
    info!(
        "wicker stopped; {} signals persisted",
        store.signal_count().unwrap_or(0)
    );

    Ok(())
}
