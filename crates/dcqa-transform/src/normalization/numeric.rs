//! Tolerant numeric parsing for spreadsheet exports.
//!
//! Monetary cells arrive as text such as `"€ 1,234.50"`, `"(200)"` or `"N/A"`.
//! Parsing never fails loudly: anything unusable becomes `None` and callers
//! decide whether that means zero.

use dcqa_model::Value;
use unicode_normalization::UnicodeNormalization;

const NULL_TOKENS: [&str; 9] = ["-", "--", "—", "–", "na", "n/a", "nan", "null", "none"];

/// True for placeholder text that stands for a missing number.
pub fn is_null_token(value: &str) -> bool {
    let lowered = value.trim().to_lowercase();
    NULL_TOKENS.contains(&lowered.as_str())
}

/// Parses a number after stripping currency symbols, thousands separators
/// and other decoration. Parentheses mean negative.
pub fn parse_number(raw: &str) -> Option<f64> {
    let composed: String = raw.nfkc().filter(|ch| *ch != '\u{a0}').collect();
    let trimmed = composed.trim();
    if trimmed.is_empty() || is_null_token(trimmed) {
        return None;
    }
    // Plain and exponent forms ("1.5E+06") before decoration is stripped.
    if let Ok(number) = trimmed.parse::<f64>() {
        return number.is_finite().then_some(number);
    }
    let kept: String = trimmed
        .chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, '-' | '.' | '(' | ')'))
        .collect();
    if kept.is_empty() {
        return None;
    }
    let signed = match kept.strip_prefix('(').and_then(|inner| inner.strip_suffix(')')) {
        Some(inner) => format!("-{inner}"),
        None => kept,
    };
    signed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric view of a cell. `NaN` numbers count as missing.
pub fn parse_number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Some(*n),
        Value::Text(text) => parse_number(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_currency_and_separators() {
        assert_eq!(parse_number("€ 1,234.50"), Some(1234.5));
        assert_eq!(parse_number("$300"), Some(300.0));
        assert_eq!(parse_number("1\u{a0}000"), Some(1000.0));
        assert_eq!(parse_number("45%"), Some(45.0));
    }

    #[test]
    fn exponent_notation_keeps_its_magnitude() {
        assert_eq!(parse_number("1.5E+06"), Some(1_500_000.0));
        assert_eq!(parse_number(" 2.5e-3 "), Some(0.0025));
        assert_eq!(parse_number("-4E2"), Some(-400.0));
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn parentheses_are_negative() {
        assert_eq!(parse_number("(200)"), Some(-200.0));
        assert_eq!(parse_number("(1,250.75)"), Some(-1250.75));
    }

    #[test]
    fn null_tokens_and_garbage_are_none() {
        for raw in ["", " ", "-", "--", "—", "N/A", "n/a", "NA", "abc", "USD -"] {
            assert_eq!(parse_number(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn values_parse_by_variant() {
        assert_eq!(parse_number_value(&Value::Number(2.5)), Some(2.5));
        assert_eq!(parse_number_value(&Value::Number(f64::NAN)), None);
        assert_eq!(parse_number_value(&Value::text("1,000")), Some(1000.0));
        assert_eq!(parse_number_value(&Value::Null), None);
    }
}
