//! Raw plan and budget batches.
//!
//! Discovers `plans_*.csv` and `budgets_*.csv` under the input directory and
//! turns each file into ordered [`dcqa_model::Record`]s with the columns the
//! pipelines expect.

pub mod batch;
pub mod csv_table;
pub mod discovery;
pub mod error;

pub use batch::{BUDGET_COLUMNS, Batch, PLAN_COLUMNS, fx_year_from_name, load_batch};
pub use csv_table::{CsvTable, detect_header_row, parse_csv_table, read_csv_table};
pub use discovery::{BatchKind, discover_batches, latest_batch, list_csv_files};
pub use error::{IngestError, Result};
