//! Raw batches as records.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use dcqa_model::{Record, Value};

use crate::csv_table::read_csv_table;
use crate::discovery::BatchKind;
use crate::error::Result;

static FX_YEAR_IN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(20\d{2})").expect("valid fiscal year pattern"));

/// Columns every plan batch carries, blank when the file lacks them.
pub const PLAN_COLUMNS: [&str; 21] = [
    "FX_Year",
    "Currency",
    "Region",
    "Market",
    "Brand",
    "Variant",
    "Channel",
    "Sub-Channel",
    "Channel Finance Group",
    "Vendor",
    "Campaign Name",
    "Objective",
    "Buying Model",
    "Innovation",
    "Inventory Buy",
    "Creative Source",
    "Start Date",
    "End Date",
    "Plan ID",
    "Plan Name",
    "Plan Status",
];

pub const BUDGET_COLUMNS: [&str; 6] = [
    "Market",
    "Region",
    "Brand",
    "ChannelFinanceGroup",
    "Sub-Channel",
    "Channel",
];

/// First `20xx` in a file name.
pub fn fx_year_from_name(name: &str) -> Option<i32> {
    FX_YEAR_IN_NAME
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|year| year.as_str().parse().ok())
}

#[derive(Debug, Clone)]
pub struct Batch {
    pub source: PathBuf,
    pub kind: BatchKind,
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Batch {
    pub fn from_rows(
        source: impl Into<PathBuf>,
        kind: BatchKind,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(row, cells)| {
                Record::from_pairs(
                    row,
                    columns.iter().cloned().zip(cells.into_iter().map(|cell| {
                        if cell.is_empty() {
                            Value::Null
                        } else {
                            Value::Text(cell)
                        }
                    })),
                )
            })
            .collect();
        Self {
            source: source.into(),
            kind,
            columns,
            records,
        }
    }

    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    /// Adds `FX_Year` from the file name when the file has no such column.
    pub fn add_fx_year_from_name(&mut self) {
        if self.has_column("FX_Year") {
            return;
        }
        let Some(year) = fx_year_from_name(&self.file_name()) else {
            return;
        };
        self.columns.push("FX_Year".to_string());
        for record in &mut self.records {
            record.set("FX_Year", f64::from(year));
        }
    }

    /// Appends blank columns for any of `names` the batch lacks.
    pub fn ensure_columns(&mut self, names: &[&str]) {
        for name in names {
            if self.has_column(name) {
                continue;
            }
            self.columns.push((*name).to_string());
            for record in &mut self.records {
                record.ensure(name);
            }
        }
    }
}

/// Reads one batch file, adds its fiscal year and expected columns.
pub fn load_batch(path: &Path, kind: BatchKind) -> Result<Batch> {
    let table = read_csv_table(path)?;
    if table.headers.is_empty() {
        warn!(path = %path.display(), "batch file has no rows");
    }
    let mut batch = Batch::from_rows(path, kind, table.headers, table.rows);
    batch.add_fx_year_from_name();
    match kind {
        BatchKind::Plans => batch.ensure_columns(&PLAN_COLUMNS),
        BatchKind::Budgets => batch.ensure_columns(&BUDGET_COLUMNS),
    }
    debug!(
        source = %path.display(),
        rows = batch.records.len(),
        columns = batch.columns.len(),
        "loaded batch"
    );
    Ok(batch)
}
