//! Calendar date parsing for work and expense records.
//!
//! Records carry day-precision dates written either the Italian way
//! (`DD/MM/YYYY`, unpadded `D/M/YYYY` also accepted) or as ISO 8601
//! (`YYYY-MM-DD`, or a full timestamp which is truncated to its date).
//! Month/day order is never guessed: slashes always mean day first.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// A date string that could not be resolved to a calendar date.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid date {input:?}: expected DD/MM/YYYY, YYYY-MM-DD or an ISO 8601 timestamp")]
pub struct DateParseError {
    pub input: String,
}

/// Parses a record date.
pub fn parse_work_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = input.trim();
    let parsed = if trimmed.contains('/') {
        parse_day_first(trimmed)
    } else {
        parse_iso(trimmed)
    };
    parsed.ok_or_else(|| DateParseError {
        input: input.to_string(),
    })
}

fn parse_day_first(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('/');
    let day = parse_component(parts.next()?, 2)?;
    let month = parse_component(parts.next()?, 2)?;
    let year_part = parts.next()?;
    if parts.next().is_some() || year_part.len() != 4 {
        return None;
    }
    let year = i32::try_from(parse_component(year_part, 4)?).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_component(s: &str, max_digits: usize) -> Option<u32> {
    if s.is_empty() || s.len() > max_digits || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_iso(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

/// Formats a date as `DD/MM/YYYY`.
pub fn format_work_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
