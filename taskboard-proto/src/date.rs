//! Calendar-date parsing for due dates and due-date filters.
//!
//! Only the calendar date matters: time-of-day and timezone offset are
//! discarded, and the date is taken as written (no conversion to UTC).

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parses a calendar date from user or record input.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (`2025-03-14T23:30:00+02:00`)
/// and naive timestamps (`2025-03-14T23:30:00`). Returns `None` for empty
/// or malformed input, which callers treat as "no date".
#[must_use]
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(stamp.date_naive());
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|stamp| stamp.date())
}
