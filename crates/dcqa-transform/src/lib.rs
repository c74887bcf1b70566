//! Value normalization and calendar proration.
//!
//! - **normalization**: text folding for comparisons, tolerant numeric and
//!   date parsing
//! - **proration**: expands period-bounded records into one row per day

pub mod normalization;
pub mod proration;

pub use normalization::{normalize_text, parse_date, parse_number};
pub use proration::{Expansion, ProrationLayout, ProrationOutput, expand, expand_all};
