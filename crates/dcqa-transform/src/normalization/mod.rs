//! Normalization functions used by matching and coercion stages:
//! - **text**: accent, punctuation, case and whitespace folding
//! - **numeric**: tolerant number parsing for spreadsheet exports
//! - **datetime**: day-first date parsing

pub mod datetime;
pub mod numeric;
pub mod text;

pub use datetime::{fiscal_year_bounds, parse_date, parse_date_value, parse_year};
pub use numeric::{is_null_token, parse_number, parse_number_value};
pub use text::{normalize_header, normalize_text};
