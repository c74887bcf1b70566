//! Calendar proration: one output row per day of a record's date range.
//!
//! Every prorated field is split evenly across the inclusive range, so the
//! daily values of a record sum back to its parsed total. Records without a
//! usable range fall back to their fiscal year; failing that they pass
//! through once with a null date and zeroed prorated fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dcqa_model::{ExceptionEvent, ExceptionLedger, IssueType, Record, Value};

use crate::normalization::{
    fiscal_year_bounds, normalize_header, parse_date_value, parse_number_value, parse_year,
};

/// Field names driving the expansion of one file layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProrationLayout {
    pub start_field: String,
    pub end_field: String,
    pub fiscal_year_field: Option<String>,
    /// Non-blank values here mark undated rows for manual review.
    pub planned_field: Option<String>,
    pub date_field: String,
    pub prorate_fields: Vec<String>,
}

impl ProrationLayout {
    /// Cleaned budget extracts.
    pub fn budgets() -> Self {
        Self {
            start_field: "Min Start Date".to_string(),
            end_field: "Max End Date".to_string(),
            fiscal_year_field: Some("FX Year".to_string()),
            planned_field: Some("Planned (Local)".to_string()),
            date_field: "Date".to_string(),
            prorate_fields: [
                "Budget (Local - Updated)",
                "Budget (Local)",
                "Planned (Local)",
                "Actualised (Local)",
                "Budget (EUR)",
                "Planned (EUR)",
                "Actualised (EUR)",
                "Budget (DKK)",
                "Planned (DKK)",
                "Actualised (DKK)",
            ]
            .map(String::from)
            .to_vec(),
        }
    }

    /// Cleaned media plans.
    pub fn plans() -> Self {
        Self {
            start_field: "Start_Date".to_string(),
            end_field: "End_Date".to_string(),
            fiscal_year_field: Some("FX_Year".to_string()),
            planned_field: Some("Total_Cost_to_Client_Local".to_string()),
            date_field: "Date".to_string(),
            prorate_fields: [
                "Impressions_Estimate",
                "Views",
                "Completed_Views",
                "Agency_Fee",
                "Total_Cost_to_Client_Actual_Local",
                "Total_Cost_to_Client_Actual_Global",
                "Total_Cost_to_Client_Local",
                "Total_Cost_to_Client_Global",
                "Net_Media_Cost_Local",
                "Net_Media_Cost_Global",
                "Media_Cost_Gross_Local",
                "Non_Media_Cost_Local",
                "Production_Costs_Local",
                "Net_Media_DKK",
                "Planned_Spend_DKK",
                "Actualised_Spend_DKK",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl Default for ProrationLayout {
    fn default() -> Self {
        Self::budgets()
    }
}

/// How a record's range was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSource {
    Explicit,
    FiscalYear,
    /// End before start; a single row dated at the start carries the total.
    Inverted,
    /// No usable dates; a single null-dated row with zeroed values.
    Undated { needs_review: bool },
}

#[derive(Debug, Clone)]
pub struct Expansion {
    pub rows: Vec<Record>,
    pub source: RangeSource,
}

#[derive(Debug, Clone, Default)]
pub struct ProrationOutput {
    pub rows: Vec<Record>,
    /// Original records that could not be dated but carried a planned value.
    pub review: Vec<Record>,
}

/// Expands one record into daily rows.
pub fn expand(record: &Record, layout: &ProrationLayout) -> Expansion {
    let start_field = resolve_field(record, &layout.start_field);
    let end_field = resolve_field(record, &layout.end_field);
    let date_anchor = end_field.clone().unwrap_or_else(|| layout.end_field.clone());
    let prorated: Vec<String> = layout
        .prorate_fields
        .iter()
        .filter_map(|field| resolve_field(record, field))
        .collect();

    let start = start_field
        .as_deref()
        .and_then(|field| record.get(field))
        .and_then(parse_date_value);
    let end = end_field
        .as_deref()
        .and_then(|field| record.get(field))
        .and_then(parse_date_value);

    let range = match (start, end) {
        (Some(start), Some(end)) => Some((start, end, RangeSource::Explicit)),
        _ => fiscal_range(record, layout).map(|(start, end)| (start, end, RangeSource::FiscalYear)),
    };

    let Some((start, end, source)) = range else {
        let needs_review = layout
            .planned_field
            .as_deref()
            .and_then(|field| resolve_field(record, field))
            .is_some_and(|field| !record.is_blank(&field));
        let mut row = record.clone();
        for field in &prorated {
            row.set(field.as_str(), 0.0);
        }
        row.insert_after(&date_anchor, layout.date_field.as_str(), Value::Null);
        return Expansion {
            rows: vec![row],
            source: RangeSource::Undated { needs_review },
        };
    };

    let (days, source) = if end < start {
        (1, RangeSource::Inverted)
    } else {
        let span = (end - start).num_days() + 1;
        (usize::try_from(span).unwrap_or(1).max(1), source)
    };
    let divisor = days as f64;

    let mut base = record.clone();
    for field in &prorated {
        let total = record
            .get(field)
            .and_then(parse_number_value)
            .unwrap_or(0.0);
        base.set(field.as_str(), total / divisor);
    }

    let rows = start
        .iter_days()
        .take(days)
        .map(|day| {
            let mut row = base.clone();
            row.insert_after(&date_anchor, layout.date_field.as_str(), day);
            row
        })
        .collect();
    Expansion { rows, source }
}

/// Expands every record, logging undated and inverted ranges to the ledger.
pub fn expand_all(
    records: &[Record],
    layout: &ProrationLayout,
    ledger: &ExceptionLedger,
) -> ProrationOutput {
    let mut output = ProrationOutput::default();
    let mut undated = 0usize;
    for record in records {
        let expansion = expand(record, layout);
        match expansion.source {
            RangeSource::Undated { needs_review } => {
                undated += 1;
                if needs_review {
                    let planned = layout
                        .planned_field
                        .as_deref()
                        .map(|field| record.text(field))
                        .unwrap_or_default();
                    ledger.append(
                        ExceptionEvent::for_record(
                            record,
                            layout.start_field.as_str(),
                            IssueType::ProrationDatesMissing,
                        )
                        .with_current(planned)
                        .with_notes("no usable dates or fiscal year; daily values zeroed"),
                    );
                    output.review.push(record.clone());
                }
            }
            RangeSource::Inverted => {
                ledger.append(
                    ExceptionEvent::for_record(
                        record,
                        layout.end_field.as_str(),
                        IssueType::ProrationRangeInverted,
                    )
                    .with_current(format!(
                        "{} > {}",
                        record.text(&layout.start_field),
                        record.text(&layout.end_field)
                    )),
                );
            }
            RangeSource::Explicit | RangeSource::FiscalYear => {}
        }
        output.rows.extend(expansion.rows);
    }
    debug!(undated, review = output.review.len(), "proration exceptions");
    info!(
        records = records.len(),
        rows = output.rows.len(),
        "expanded records to daily rows"
    );
    output
}

fn fiscal_range(record: &Record, layout: &ProrationLayout) -> Option<(NaiveDate, NaiveDate)> {
    let field = layout.fiscal_year_field.as_deref()?;
    let field = resolve_field(record, field)?;
    let year = record.get(&field).and_then(parse_year)?;
    fiscal_year_bounds(year)
}

/// Matches a configured name against the record's headers, tolerating
/// Unicode spacing differences.
fn resolve_field(record: &Record, wanted: &str) -> Option<String> {
    if record.contains(wanted) {
        return Some(wanted.to_string());
    }
    let wanted = normalize_header(wanted);
    record
        .names()
        .find(|name| normalize_header(name) == wanted)
        .map(str::to_string)
}
