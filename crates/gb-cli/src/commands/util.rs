//! Shared utilities for CLI commands.

use chrono::{Local, NaiveDate};
use gb_core::{Cents, DateParseError, WorkTypes, parse_work_date};

/// Parses a date argument in any of the accepted work-date formats.
pub fn parse_date_arg(s: &str) -> Result<NaiveDate, DateParseError> {
    parse_work_date(s)
}

/// The caller's local date, or `explicit` when given.
pub fn today_or(explicit: Option<NaiveDate>) -> NaiveDate {
    explicit.unwrap_or_else(|| Local::now().date_naive())
}

/// Formats an amount with its currency sign.
pub fn format_money(amount: Cents) -> String {
    format!("€{amount}")
}

/// Joins type labels for display; `-` when there are none.
pub fn format_types(types: &WorkTypes) -> String {
    if types.is_empty() {
        return "-".to_string();
    }
    types
        .iter()
        .map(gb_core::WorkType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats decimal hours without trailing zeros.
pub fn format_hours(hours: f64) -> String {
    let rendered = format!("{hours:.2}");
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}h")
}
