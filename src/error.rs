use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum BotError {
    /// Not enough candle history for a configuration. Recoverable: the
    /// configuration is skipped until enough data accumulates.
    #[error("insufficient data: {required} candles required, {available} available")]
    InsufficientData { required: usize, available: usize },

    /// Invalid configuration detected at startup. Fatal.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A candle update with missing or non-finite fields. The update is
    /// dropped and the pipeline continues.
    #[error("malformed candle: {0}")]
    MalformedCandle(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl BotError {
    /// Whether the pipeline can keep running after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BotError::InvalidConfiguration(_))
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
