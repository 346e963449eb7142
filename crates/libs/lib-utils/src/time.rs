//! # Time Utilities
//!
//! Utilities for time formatting and manipulation using chrono.
//!
//! Wire timestamps use the JavaScript `Date.toISOString()` shape:
//! millisecond precision and a `Z` suffix (`2024-01-01T00:00:00.000Z`).

use chrono::{DateTime, SecondsFormat, Utc};

/// Get current UTC time.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Format time as an ISO-8601 UTC string with millisecond precision.
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time, formatted for the wire.
pub fn now_iso() -> String {
    format_time(now_utc())
}
