//! Watermark store: the single "last successful sync" instant.

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::error::Result;
use crate::time::{format_instant, parse_instant};

/// Sentinel "beginning of time" watermark used before the first sync.
pub const WATERMARK_SENTINEL: &str = "2000-01-01T00:00:00Z";

const WATERMARK_KEY: &str = "last_sync_time";

/// Trait for watermark persistence.
///
/// Read at the start of every cycle; written exactly once, as the last
/// action of a fully successful cycle.
pub trait WatermarkStore {
    /// The last successful sync instant, or the sentinel when absent.
    fn read(&self) -> Result<DateTime<Utc>>;

    /// Persist a new watermark.
    fn write(&self, instant: DateTime<Utc>) -> Result<()>;
}

/// `SQLite` implementation backed by the `settings` key-value table.
pub struct SqliteWatermarkStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteWatermarkStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn sentinel() -> DateTime<Utc> {
        // The sentinel constant is known-good RFC 3339
        parse_instant(WATERMARK_SENTINEL)
            .map_or_else(|_| DateTime::<Utc>::UNIX_EPOCH, |instant| instant)
    }
}

impl WatermarkStore for SqliteWatermarkStore<'_> {
    fn read(&self) -> Result<DateTime<Utc>> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                [WATERMARK_KEY],
                |row| row.get(0),
            )
            .map_or_else(
                |error| match error {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                },
                |value| Ok(Some(value)),
            )?;

        match stored {
            Some(value) => match parse_instant(&value) {
                Ok(instant) => Ok(instant),
                Err(error) => {
                    tracing::warn!("Stored watermark is unparseable ({error}), using sentinel");
                    Ok(Self::sentinel())
                }
            },
            None => Ok(Self::sentinel()),
        }
    }

    fn write(&self, instant: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            [WATERMARK_KEY, &format_instant(instant)],
        )?;
        Ok(())
    }
}
