//! Exact timestamp parsing shared by the cutoff and the donation log.
//!
//! chrono's `parse_from_str` skips whitespace before numeric fields and accepts `:60` as a leap
//! second. Neither is a valid value here, so both are refused on top of the format match.

use chrono::{NaiveDateTime, Timelike};

/// Parses `value` with `format`, refusing extra whitespace and leap seconds.
pub fn parse_exact(value: &str, format: &str) -> Option<NaiveDateTime> {
    if value.starts_with(char::is_whitespace)
        || whitespace_count(value) != whitespace_count(format)
    {
        return None;
    }
    let dt = NaiveDateTime::parse_from_str(value, format).ok()?;
    if dt.nanosecond() >= 1_000_000_000 {
        return None;
    }
    Some(dt)
}

fn whitespace_count(s: &str) -> usize {
    s.chars().filter(|c| c.is_whitespace()).count()
}
