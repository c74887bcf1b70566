//! Artifact files written by each command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use dcqa_core::{BrandCheckRun, CleanRun, union_columns};
use dcqa_ingest::read_csv_table;
use dcqa_model::{ExceptionLedger, Record, Value};
use dcqa_report::{write_brand_issues, write_exceptions, write_mapping_diff, write_records};
use dcqa_transform::{ProrationLayout, expand_all};

/// Date stamp used in output file names.
pub fn stamp(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Writes the plans, mapping diff, exceptions and budgets artifacts.
pub fn write_clean_outputs(out_dir: &Path, run: &CleanRun, date: NaiveDate) -> Result<Vec<PathBuf>> {
    let stamp = stamp(date);
    let mut written = Vec::new();

    let path = out_dir.join(format!("Plans_Clean_{stamp}.csv"));
    write_records(&path, &run.plans.columns, &run.plans.records).context("write cleaned plans")?;
    written.push(path);

    let path = out_dir.join(format!("Plans_MappingDiffs_{stamp}.csv"));
    write_mapping_diff(&path, &run.plans.mapping_diff).context("write mapping diff")?;
    written.push(path);

    let path = out_dir.join("Exceptions.csv");
    write_exceptions(&path, &run.ledger.snapshot()).context("write exceptions")?;
    written.push(path);

    if run.budgets.batches > 0 {
        let path = out_dir.join(format!("Budgets_Clean_{stamp}.csv"));
        write_records(&path, &run.budgets.columns, &run.budgets.records)
            .context("write cleaned budgets")?;
        written.push(path);
    }
    for path in &written {
        info!(path = %path.display(), "wrote artifact");
    }
    Ok(written)
}

pub fn write_brand_check_outputs(
    out_dir: &Path,
    run: &BrandCheckRun,
    date: NaiveDate,
) -> Result<Vec<PathBuf>> {
    let stamp = stamp(date);
    let records_path = out_dir.join(format!("Plans_TwoPass_{stamp}.csv"));
    write_records(&records_path, &run.columns, &run.records).context("write two-pass plans")?;
    let issues_path = out_dir.join(format!("Brand_Issues_{stamp}.csv"));
    let issues = write_brand_issues(&issues_path, &run.ledger.snapshot())
        .context("write brand issues")?;
    info!(issues, path = %issues_path.display(), "wrote brand issues");
    Ok(vec![records_path, issues_path])
}

#[derive(Debug)]
pub struct ProrateResult {
    pub input_rows: usize,
    pub daily_rows: usize,
    pub review: Option<PathBuf>,
    pub ledger: ExceptionLedger,
}

/// `<stem>_manual_review.csv` next to `output`.
pub fn review_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "prorated".to_string());
    output.with_file_name(format!("{stem}_manual_review.csv"))
}

fn read_records(path: &Path) -> Result<Vec<Record>> {
    let table = read_csv_table(path).with_context(|| format!("read {}", path.display()))?;
    let headers = table.headers;
    Ok(table
        .rows
        .into_iter()
        .enumerate()
        .map(|(row, cells)| {
            Record::from_pairs(
                row,
                headers.iter().cloned().zip(cells.into_iter().map(|cell| {
                    if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::Text(cell)
                    }
                })),
            )
        })
        .collect())
}

/// Expands `input` into daily rows at `output`, plus a manual-review file
/// when some rows could not be dated.
pub fn prorate_file(input: &Path, layout: &ProrationLayout, output: &Path) -> Result<ProrateResult> {
    let records = read_records(input)?;
    let ledger = ExceptionLedger::new();
    let expanded = expand_all(&records, layout, &ledger);

    let columns = union_columns(&expanded.rows);
    write_records(output, &columns, &expanded.rows).context("write daily rows")?;

    let review = if expanded.review.is_empty() {
        None
    } else {
        let path = review_path(output);
        write_records(&path, &union_columns(&expanded.review), &expanded.review)
            .context("write manual review rows")?;
        Some(path)
    };
    Ok(ProrateResult {
        input_rows: records.len(),
        daily_rows: expanded.rows.len(),
        review,
        ledger,
    })
}
