//! Outbound collaborators: persistence and notification delivery.
//!
//! The sink task consumes pipeline events from an unbounded channel and
//! fans them out. Delivery failures are logged and never propagate back
//! into the detection pipeline.

pub mod discord;
pub mod store;

pub use discord::DiscordNotifier;
pub use store::SignalStore;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::services::PipelineEvent;

/// Consume pipeline events until every pipeline sender has dropped,
/// persisting touches and signals and dispatching notifications.
pub async fn run_sink(
    mut event_rx: mpsc::UnboundedReceiver<PipelineEvent>,
    store: Arc<SignalStore>,
    notifier: Option<DiscordNotifier>,
) {
    info!("sink task started");

    while let Some(event) = event_rx.recv().await {
        match event {
            PipelineEvent::Touch(touch) => {
                if let Err(e) = store.insert_touch(&touch) {
                    error!("failed to persist touch: {}", e);
                }
            }
            PipelineEvent::Signal(signal) => {
                if let Err(e) = store.insert_signal(&signal) {
                    error!("failed to persist signal {}: {}", signal.id, e);
                }
                if let Some(ref notifier) = notifier {
                    if let Err(e) = notifier.send(&signal).await {
                        error!("notification for {} failed: {}", signal.id, e);
                    }
                }
            }
        }
    }

    info!("sink task stopped");
}
