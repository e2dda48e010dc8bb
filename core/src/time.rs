//! Time related utils.

use chrono::Utc;

use crate::Error;

/// The timestamp used throughout the signing pipeline, always UTC.
pub type DateTime = chrono::DateTime<Utc>;

/// Current time in UTC.
pub fn now() -> DateTime {
    Utc::now()
}

/// Short date form: `YYYYMMDD`.
pub fn format_date(t: DateTime) -> String {
    t.format("%Y%m%d").to_string()
}

/// Long timestamp form: `YYYYMMDD'T'HHMMSS'Z'`.
pub fn format_iso8601(t: DateTime) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Parse an RFC 3339 timestamp like `2023-12-01T12:00:00Z` into UTC.
pub fn parse_rfc3339(s: &str) -> crate::Result<DateTime> {
    let dt = chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| Error::unexpected(format!("parsing timestamp {s} failed")).with_source(e))?;
    Ok(dt.with_timezone(&Utc))
}
