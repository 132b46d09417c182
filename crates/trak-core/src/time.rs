//! Timestamp reconciler.
//!
//! Remote payloads and legacy local rows carry timestamps in more than one
//! shape: offset-aware RFC 3339 (`2024-05-01T10:00:00Z`), offset-less local
//! date-times (`2024-05-01T10:00:00`), and the occasional space-separated
//! variant. Everything funnels through [`parse_instant`] so the rest of the
//! system only ever sees `DateTime<Utc>`.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Timelike, Utc};
use thiserror::Error;

/// The current instant, truncated to microsecond precision.
///
/// Both the local store and the wire format carry microseconds, so every
/// locally assigned timestamp is truncated up front to keep round trips
/// exact.
#[must_use]
pub fn now() -> DateTime<Utc> {
    let instant = Utc::now();
    instant
        .with_nanosecond(instant.nanosecond() / 1000 * 1000)
        .unwrap_or(instant)
}

/// Failure to interpret a textual timestamp as an instant.
#[derive(Debug, Error)]
#[error("unparseable timestamp: {value:?}")]
pub struct ParseInstantError {
    /// The offending input, truncated for logging.
    pub value: String,
}

/// Parse a timestamp from an untrusted source into a canonical UTC instant.
///
/// Tried in order: an offset-aware RFC 3339 parse, then an offset-less
/// date-time interpreted as UTC. A space separator is accepted in place of
/// `T` for legacy payloads.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, ParseInstantError> {
    let trimmed = value.trim();
    let candidate = if trimmed.contains(' ') {
        trimmed.replacen(' ', "T", 1)
    } else {
        trimmed.to_string()
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&candidate) {
        return Ok(parsed.with_timezone(&Utc));
    }

    // Offset-less local format, interpreted as UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(&candidate, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }

    Err(ParseInstantError {
        value: crate::util::compact_text(value),
    })
}

/// Parse an optional instant; absence and parse failures both propagate as
/// `None` rather than being substituted with "now" or epoch.
pub fn parse_optional_instant(value: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    match parse_instant(raw) {
        Ok(instant) => Some(instant),
        Err(error) => {
            tracing::warn!("Dropping unparseable timestamp: {error}");
            None
        }
    }
}

/// Parse a required instant (`created_at`/`updated_at` on inbound records).
///
/// When no parseable value exists the current instant is substituted and the
/// record is flagged as degraded data in the log.
pub fn parse_required_instant(value: Option<&str>, field: &str) -> DateTime<Utc> {
    parse_optional_instant(value).unwrap_or_else(|| {
        tracing::warn!(field, "Missing or unparseable required timestamp, substituting now");
        now()
    })
}

/// Format an instant as fixed-width UTC RFC 3339 with microsecond precision.
///
/// The fixed width keeps stored strings lexicographically ordered by time,
/// which the local store relies on for `updated_at > ?` comparisons.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}
