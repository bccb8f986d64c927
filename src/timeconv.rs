//! Conversion of STH `recvTime` strings into local civil time.
//!
//! The STH API reports receive times as ISO-8601 UTC (`2024-01-01T12:00:00.000Z`).
//! After separator normalization two shapes are tolerated, with and without
//! fractional seconds. Anything else is an error for the whole call.

use chrono::{DateTime, NaiveDateTime, SecondsFormat};
use chrono_tz::Tz;

const WITH_FRACTION: &str = "%Y-%m-%d %H:%M:%S%.f";
const WITHOUT_FRACTION: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("unparseable timestamp '{0}'")]
    Unparseable(String),
}

/// Turn `2024-01-01T12:00:00.000Z` into `2024-01-01 12:00:00.000`.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.replace('T', " ").replace('Z', "")
}

/// Parse one raw timestamp as a naive UTC wall-clock value.
///
/// # Errors
///
/// Returns `TimestampError::Unparseable` when neither tolerated shape matches.
pub fn parse_naive_utc(raw: &str) -> Result<NaiveDateTime, TimestampError> {
    let normalized = normalize(raw);
    let trimmed = normalized.trim();

    // Fractional seconds first, STH normally sends milliseconds
    NaiveDateTime::parse_from_str(trimmed, WITH_FRACTION)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, WITHOUT_FRACTION))
        .map_err(|_| TimestampError::Unparseable(raw.to_string()))
}

/// Convert UTC timestamps to `tz`, preserving order and length.
///
/// # Errors
///
/// Fails on the first timestamp that matches neither tolerated shape; no
/// partial result is returned.
pub fn to_local<S: AsRef<str>>(timestamps: &[S], tz: Tz) -> Result<Vec<DateTime<Tz>>, TimestampError> {
    timestamps
        .iter()
        .map(|raw| parse_naive_utc(raw.as_ref()).map(|naive| naive.and_utc().with_timezone(&tz)))
        .collect()
}

/// Wire representation of a local timestamp (RFC 3339 with the local offset).
#[must_use]
pub fn format_local(ts: &DateTime<Tz>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}
