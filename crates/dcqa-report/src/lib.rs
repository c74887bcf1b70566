//! CSV artifacts of a cleaning run.
//!
//! - **table**: value rendering and BOM-prefixed CSV output
//! - **exceptions**: the exception list and the brand-issue view
//! - **fix_packs**: review CSVs for unresolved mappings

pub mod error;
pub mod exceptions;
pub mod fix_packs;
pub mod table;

use std::path::Path;

use dcqa_core::MappingDiff;

pub use error::{ReportError, Result};
pub use exceptions::{
    exception_columns, is_brand_issue, write_brand_issues, write_exceptions, write_exceptions_to,
};
pub use fix_packs::{FixPack, build_fix_packs, write_fix_packs};
pub use table::{record_rows, render, write_csv_file, write_records, write_rows};

pub fn write_mapping_diff(path: &Path, diff: &MappingDiff) -> Result<()> {
    write_csv_file(path, &diff.columns, &diff.rows)
}
