//! SQLite persistence for emitted signals and evaluated touches.
//!
//! Writes are append-only. Signal ids are unique and inserts are
//! idempotent, so reprocessing the same signal never duplicates a row.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use tracing::{debug, error, info};

use crate::types::{BandLabel, Direction, Timeframe, TradingSignal, WickSide, WickTouch};

/// SQLite store for signal and touch records.
pub struct SignalStore {
    conn: Mutex<Connection>,
}

impl SignalStore {
    /// Create a store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("signal store initialized");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn new_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("in-memory signal store initialized");
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS signals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                signal_id TEXT UNIQUE NOT NULL,
                symbol TEXT NOT NULL,
                config_name TEXT NOT NULL,
                direction TEXT NOT NULL,
                entry_price REAL NOT NULL,
                band_value REAL NOT NULL,
                stop_loss REAL NOT NULL,
                take_profit REAL NOT NULL,
                confidence REAL NOT NULL,
                expected_profit REAL NOT NULL,
                band_label TEXT NOT NULL,
                touch_side TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_signals_config
             ON signals(config_name, direction)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_signals_timestamp
             ON signals(timestamp DESC)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS touches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                config_name TEXT NOT NULL,
                band_label TEXT NOT NULL,
                side TEXT NOT NULL,
                touch_price REAL NOT NULL,
                band_value REAL NOT NULL,
                distance REAL NOT NULL,
                confidence REAL NOT NULL,
                timeframe TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_touches_config
             ON touches(config_name, timestamp DESC)",
            [],
        )?;

        Ok(())
    }

    /// Append a signal. Idempotent: a signal id already present is ignored.
    pub fn insert_signal(&self, signal: &TradingSignal) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO signals (
                signal_id, symbol, config_name, direction, entry_price,
                band_value, stop_loss, take_profit, confidence,
                expected_profit, band_label, touch_side, timeframe, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                signal.id,
                signal.symbol,
                signal.config_name,
                signal.direction.as_str(),
                signal.entry_price,
                signal.band_value,
                signal.stop_loss,
                signal.take_profit,
                signal.confidence,
                signal.expected_profit,
                signal.band_label.as_str(),
                signal.touch_side.as_str(),
                signal.timeframe.as_str(),
                signal.timestamp,
            ],
        )?;
        Ok(())
    }

    /// Append a touch record to the audit log.
    pub fn insert_touch(&self, touch: &WickTouch) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO touches (
                config_name, band_label, side, touch_price, band_value,
                distance, confidence, timeframe, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                touch.config_name,
                touch.band_label.as_str(),
                touch.side.as_str(),
                touch.touch_price,
                touch.band_value,
                touch.distance,
                touch.confidence,
                touch.timeframe.as_str(),
                touch.timestamp,
            ],
        )?;
        Ok(())
    }

    /// Number of persisted signals.
    pub fn signal_count(&self) -> Result<u64, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM signals", [], |row| row.get(0))
    }

    /// Number of persisted touches.
    pub fn touch_count(&self) -> Result<u64, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM touches", [], |row| row.get(0))
    }

    /// The most recently emitted signals, newest first.
    pub fn recent_signals(&self, limit: usize) -> Result<Vec<TradingSignal>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT signal_id, symbol, config_name, direction, entry_price,
                    band_value, stop_loss, take_profit, confidence,
                    expected_profit, band_label, touch_side, timeframe, timestamp
             FROM signals ORDER BY timestamp DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            let direction: String = row.get(3)?;
            let band_label: String = row.get(10)?;
            let touch_side: String = row.get(11)?;
            let timeframe: String = row.get(12)?;

            Ok(TradingSignal {
                id: row.get(0)?,
                symbol: row.get(1)?,
                config_name: row.get(2)?,
                direction: Direction::from_str(&direction).unwrap_or(Direction::Long),
                entry_price: row.get(4)?,
                band_value: row.get(5)?,
                stop_loss: row.get(6)?,
                take_profit: row.get(7)?,
                confidence: row.get(8)?,
                expected_profit: row.get(9)?,
                band_label: BandLabel::from_str(&band_label).unwrap_or(BandLabel::Middle),
                touch_side: WickSide::from_str(&touch_side).unwrap_or(WickSide::Lower),
                timeframe: Timeframe::from_str(&timeframe).unwrap_or(Timeframe::FiveMinutes),
                timestamp: row.get(13)?,
            })
        })?;

        let mut signals = Vec::new();
        for row in rows {
            match row {
                Ok(signal) => signals.push(signal),
                Err(e) => error!("error reading signal row: {}", e),
            }
        }
        Ok(signals)
    }
}
