//! Discord webhook notifications for emitted signals.

use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use crate::error::Result;
use crate::types::TradingSignal;

/// Sends finalized signals to a Discord webhook.
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Self {
        let client = Client::builder()
            .user_agent("wicker/1.0")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            webhook_url,
        }
    }

    /// Format a signal as a Discord message.
    pub fn format_message(signal: &TradingSignal) -> String {
        format!(
            "**New trading signal: {id}**\n\
             {direction} {symbol} @ ${entry:.2}\n\
             Strategy: {config} ({side} on {band} band, band value ${band_value:.2})\n\
             Stop loss: ${sl:.2} ({sl_pct:+.1}%) | Take profit: ${tp:.2} ({tp_pct:+.1}%)\n\
             Confidence: {confidence:.0}% | Expected profit: {profit:.1}% | Timeframe: {tf}",
            id = signal.id,
            direction = signal.direction.as_str(),
            symbol = signal.symbol,
            entry = signal.entry_price,
            config = signal.config_name,
            side = signal.touch_side.as_str(),
            band = signal.band_label.as_str(),
            band_value = signal.band_value,
            sl = signal.stop_loss,
            sl_pct = signal.stop_loss_pct(),
            tp = signal.take_profit,
            tp_pct = signal.take_profit_pct(),
            confidence = signal.confidence * 100.0,
            profit = signal.expected_profit,
            tf = signal.timeframe.as_str(),
        )
    }

    /// Deliver a signal notification. Failures are reported to the caller
    /// for logging, never retried.
    pub async fn send(&self, signal: &TradingSignal) -> Result<()> {
        let payload = json!({ "content": Self::format_message(signal) });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            info!("Discord alert sent for {}", signal.id);
        } else {
            warn!(
                "Discord alert for {} failed: {}",
                signal.id,
                response.status()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BandLabel, Direction, Timeframe, WickSide};

    #[test]
    fn test_format_message_contains_risk_levels() {
        let signal = TradingSignal {
            id: "VWMA_12_0.1_LONG_1700000000".to_string(),
            symbol: "BTCUSDT".to_string(),
            config_name: "VWMA_12_0.1".to_string(),
            direction: Direction::Long,
            entry_price: 42150.5,
            band_value: 42148.3,
            stop_loss: 29505.35,
            take_profit: 50580.6,
            confidence: 0.85,
            expected_profit: 28.51,
            band_label: BandLabel::Middle,
            touch_side: WickSide::Lower,
            timeframe: Timeframe::FiveMinutes,
            timestamp: 1_700_000_000_000,
        };

        let message = DiscordNotifier::format_message(&signal);
        assert!(message.contains("VWMA_12_0.1_LONG_1700000000"));
        assert!(message.contains("LONG BTCUSDT @ $42150.50"));
        assert!(message.contains("$29505.35 (-30.0%)"));
        assert!(message.contains("$50580.60 (+20.0%)"));
        assert!(message.contains("Confidence: 85%"));
        assert!(message.contains("Expected profit: 28.5%"));
        assert!(message.contains("Timeframe: 5m"));
    }
}
