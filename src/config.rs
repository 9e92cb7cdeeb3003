use std::env;

use crate::error::{BotError, Result};
use crate::services::history::DEFAULT_HISTORY_LIMIT;
use crate::services::signals::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_COOLDOWN_SECS, DEFAULT_STOP_LOSS_FRACTION,
    DEFAULT_TAKE_PROFIT_FRACTION,
};
use crate::services::wick::DEFAULT_TOLERANCE;
use crate::types::{BandConfig, BandLabel, MaKind, Timeframe};

/// Application configuration. Static per run; validated at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Trading pair to monitor, e.g. "BTCUSDT".
    pub symbol: String,
    /// Monitored candle timeframes.
    pub timeframes: Vec<Timeframe>,
    /// Band configurations evaluated per candle.
    pub band_configs: Vec<BandConfig>,
    /// Relative wick-touch tolerance (0.0001 = 0.01%).
    pub tolerance: f64,
    /// Minimum touch confidence for signal emission.
    pub confidence_threshold: f64,
    /// Cooldown between signals per (configuration, direction), seconds.
    pub cooldown_secs: u64,
    /// Stop-loss fraction of entry price.
    pub stop_loss_fraction: f64,
    /// Take-profit fraction of entry price.
    pub take_profit_fraction: f64,
    /// Closed candles retained per timeframe.
    pub history_limit: usize,
    /// Minimum age (ms) before a live candle becomes signal-eligible.
    /// Zero restricts signal detection to closed candles.
    pub live_min_age_ms: i64,
    /// Discord webhook URL for signal notifications.
    pub discord_webhook_url: Option<String>,
    /// SQLite database path for signal persistence.
    pub db_path: String,
    /// Interval between status log lines, seconds.
    pub status_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables. Fails with
    /// `InvalidConfiguration` on unparseable or out-of-range values.
    pub fn from_env() -> Result<Self> {
        let timeframes = match env::var("TIMEFRAMES") {
            Ok(raw) => parse_timeframes(&raw)?,
            Err(_) => vec![Timeframe::FiveMinutes, Timeframe::FifteenMinutes],
        };

        let band_configs = match env::var("BAND_CONFIGS") {
            Ok(raw) => parse_band_configs(&raw)?,
            Err(_) => default_band_configs(),
        };

        let config = Self {
            symbol: env::var("SYMBOL").unwrap_or_else(|_| "BTCUSDT".to_string()),
            timeframes,
            band_configs,
            tolerance: parse_env("TOUCH_TOLERANCE", DEFAULT_TOLERANCE)?,
            confidence_threshold: parse_env(
                "CONFIDENCE_THRESHOLD",
                DEFAULT_CONFIDENCE_THRESHOLD,
            )?,
            cooldown_secs: parse_env("COOLDOWN_SECS", DEFAULT_COOLDOWN_SECS)?,
            stop_loss_fraction: parse_env("STOP_LOSS_FRACTION", DEFAULT_STOP_LOSS_FRACTION)?,
            take_profit_fraction: parse_env(
                "TAKE_PROFIT_FRACTION",
                DEFAULT_TAKE_PROFIT_FRACTION,
            )?,
            history_limit: parse_env("HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?,
            live_min_age_ms: parse_env("LIVE_MIN_AGE_MS", 0)?,
            discord_webhook_url: env::var("DISCORD_WEBHOOK_URL").ok().filter(|s| !s.is_empty()),
            db_path: env::var("DB_PATH").unwrap_or_else(|_| "wicker.db".to_string()),
            status_interval_secs: parse_env("STATUS_INTERVAL_SECS", 300)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the assembled configuration. Fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(BotError::InvalidConfiguration("empty symbol".to_string()));
        }
        if self.timeframes.is_empty() {
            return Err(BotError::InvalidConfiguration(
                "no timeframes configured".to_string(),
            ));
        }
        if self.band_configs.is_empty() {
            return Err(BotError::InvalidConfiguration(
                "no band configurations".to_string(),
            ));
        }
        for band_config in &self.band_configs {
            band_config.validate()?;
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(BotError::InvalidConfiguration(
                "tolerance must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(BotError::InvalidConfiguration(
                "confidence threshold must be within [0, 1]".to_string(),
            ));
        }
        if self.stop_loss_fraction <= 0.0 || self.take_profit_fraction <= 0.0 {
            return Err(BotError::InvalidConfiguration(
                "stop-loss and take-profit fractions must be positive".to_string(),
            ));
        }
        let max_period = self
            .band_configs
            .iter()
            .map(|c| c.period)
            .max()
            .unwrap_or(0);
        if self.history_limit < max_period {
            return Err(BotError::InvalidConfiguration(format!(
                "history limit {} below largest configured period {}",
                self.history_limit, max_period
            )));
        }
        Ok(())
    }

    /// A small valid configuration for unit tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            timeframes: vec![Timeframe::FiveMinutes],
            band_configs: default_band_configs(),
            tolerance: DEFAULT_TOLERANCE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            stop_loss_fraction: DEFAULT_STOP_LOSS_FRACTION,
            take_profit_fraction: DEFAULT_TAKE_PROFIT_FRACTION,
            history_limit: DEFAULT_HISTORY_LIMIT,
            live_min_age_ms: 0,
            discord_webhook_url: None,
            db_path: ":memory:".to_string(),
            status_interval_secs: 300,
        }
    }
}

/// The proven configurations from the historical analysis, with their
/// expected profit percentages.
pub fn default_band_configs() -> Vec<BandConfig> {
    let mut configs = vec![
        BandConfig::new(MaKind::Vwma, 12, 0.1, BandLabel::Middle),
        BandConfig::new(MaKind::Wma, 43, 0.1, BandLabel::Middle),
        BandConfig::new(MaKind::Sma, 9, 0.1, BandLabel::Middle),
    ];
    configs[0].expected_profit = Some(28.51);
    configs[1].expected_profit = Some(26.00);
    configs[2].expected_profit = Some(24.80);
    configs
}

/// Parse a comma-separated timeframe list, e.g. "5m,15m".
fn parse_timeframes(raw: &str) -> Result<Vec<Timeframe>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Timeframe::from_str(s).ok_or_else(|| {
                BotError::InvalidConfiguration(format!("unknown timeframe: {s}"))
            })
        })
        .collect()
}

/// Parse a comma-separated configuration list. Each entry is
/// "KIND:period:stddev:band[:expected_profit]", e.g. "VWMA:12:0.1:middle".
fn parse_band_configs(raw: &str) -> Result<Vec<BandConfig>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_band_config)
        .collect()
}

fn parse_band_config(entry: &str) -> Result<BandConfig> {
    let parts: Vec<&str> = entry.split(':').collect();
    if parts.len() < 4 || parts.len() > 5 {
        return Err(BotError::InvalidConfiguration(format!(
            "band configuration '{entry}' must be KIND:period:stddev:band[:expected_profit]"
        )));
    }

    let ma_kind = MaKind::from_str(parts[0]).ok_or_else(|| {
        BotError::InvalidConfiguration(format!("unknown moving-average kind: {}", parts[0]))
    })?;
    let period: usize = parts[1].parse().map_err(|_| {
        BotError::InvalidConfiguration(format!("invalid period: {}", parts[1]))
    })?;
    let std_dev_multiplier: f64 = parts[2].parse().map_err(|_| {
        BotError::InvalidConfiguration(format!("invalid multiplier: {}", parts[2]))
    })?;
    let band_label = BandLabel::from_str(parts[3]).ok_or_else(|| {
        BotError::InvalidConfiguration(format!("unknown band label: {}", parts[3]))
    })?;

    let mut config = BandConfig::new(ma_kind, period, std_dev_multiplier, band_label);
    if let Some(profit_raw) = parts.get(4) {
        let profit: f64 = profit_raw.parse().map_err(|_| {
            BotError::InvalidConfiguration(format!("invalid expected profit: {profit_raw}"))
        })?;
        config.expected_profit = Some(profit);
    }
    config.validate()?;
    Ok(config)
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| {
            BotError::InvalidConfiguration(format!("invalid value for {name}: {raw}"))
        }),
        Err(_) => Ok(default),
    }
}
