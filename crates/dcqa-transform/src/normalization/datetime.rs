//! Day-first date parsing.
//!
//! Plan extracts mix ISO dates with European `dd/mm/yyyy` text, so ambiguous
//! numeric dates are read day first.

use chrono::{Datelike, NaiveDate};
use dcqa_model::Value;

const DATE_FORMATS: [&str; 12] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
];

/// Parses a date, ignoring a trailing time component.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(date) = try_formats(trimmed) {
        return Some(date);
    }
    if trimmed.contains(':') {
        let date_part = trimmed
            .split_once('T')
            .or_else(|| trimmed.rsplit_once(' '))
            .map(|(head, _)| head.trim())?;
        return try_formats(date_part);
    }
    None
}

pub fn parse_date_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(date) => Some(*date),
        Value::Text(text) => parse_date(text),
        _ => None,
    }
}

/// Reads a fiscal year from `2024`, `2024.0` or `" 2024 "`.
pub fn parse_year(value: &Value) -> Option<i32> {
    let number = match value {
        Value::Number(n) => *n,
        Value::Text(text) => text.trim().parse::<f64>().ok()?,
        Value::Date(date) => return Some(date.year()),
        Value::Null => return None,
    };
    if !number.is_finite() || !(1.0..=9999.0).contains(&number) {
        return None;
    }
    Some(number.trunc() as i32)
}

/// January 1st and December 31st of `year`.
pub fn fiscal_year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

// Years below 1900 only come from a year-first format swallowing a day.
fn try_formats(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(value, format)
            .ok()
            .filter(|date| date.year() >= 1900)
    })
}
