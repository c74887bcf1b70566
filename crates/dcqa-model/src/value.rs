//! Cell values carried by raw and cleaned records.

use std::fmt;

use chrono::NaiveDate;

/// A single field value.
///
/// Raw ingestion produces `Text`; coercion stages turn designated fields into
/// `Number` or `Date`. `Number(f64::NAN)` marks a value that could not be
/// computed (for example a missing FX rate) and is deliberately not blank.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// True for `Null` and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(_) | Self::Date(_) => false,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Number(n) if n.is_nan())
    }

    /// Numeric view without any text parsing. NaN is returned as-is.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Number(n) => write!(f, "{n}"),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Option<f64>> for Value {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Null, Self::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(Value::Null.is_blank());
        assert!(Value::text("   ").is_blank());
        assert!(!Value::text("x").is_blank());
        assert!(!Value::Number(0.0).is_blank());
        assert!(!Value::Number(f64::NAN).is_blank());
    }

    #[test]
    fn renders_numbers_without_trailing_zeros() {
        assert_eq!(Value::Number(2024.0).to_string(), "2024");
        assert_eq!(Value::Number(12.5).to_string(), "12.5");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn renders_dates_iso() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2024-03-09");
    }
}
