//! The exception artifact and its brand-only view.

use std::io::Write;
use std::path::Path;

use dcqa_model::{EXCEPTION_COLUMNS, ExceptionEvent, IssueType};

use crate::error::Result;
use crate::table::{write_csv_file, write_rows};

const BRAND_ISSUE_COLUMNS: [&str; 7] = [
    "Market",
    "Plan_ID",
    "Plan_Name",
    "Issue_Type",
    "Current_Value",
    "Suggested_Value",
    "Notes",
];

/// Fixed columns followed by extra columns in first-seen order.
pub fn exception_columns(events: &[ExceptionEvent]) -> Vec<String> {
    let mut columns: Vec<String> = EXCEPTION_COLUMNS.iter().map(|c| (*c).to_string()).collect();
    for event in events {
        for (name, _) in &event.extra {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
    }
    columns
}

fn event_rows(events: &[ExceptionEvent], columns: &[String]) -> Vec<Vec<String>> {
    events
        .iter()
        .map(|event| columns.iter().map(|c| event.column(c).into_owned()).collect())
        .collect()
}

pub fn write_exceptions_to<W: Write>(
    writer: W,
    events: &[ExceptionEvent],
) -> std::result::Result<(), csv::Error> {
    let columns = exception_columns(events);
    write_rows(writer, &columns, &event_rows(events, &columns))
}

pub fn write_exceptions(path: &Path, events: &[ExceptionEvent]) -> Result<()> {
    let columns = exception_columns(events);
    write_csv_file(path, &columns, &event_rows(events, &columns))
}

pub fn is_brand_issue(issue: &IssueType) -> bool {
    matches!(
        issue,
        IssueType::BrandUnmapped
            | IssueType::BrandConflict
            | IssueType::BrandConflictWithPlanName
            | IssueType::BrandInferredFromTitle
            | IssueType::BrandOkNoTitleSignal
    )
}

/// Brand events only, in a narrower layout for brand owners.
pub fn write_brand_issues(path: &Path, events: &[ExceptionEvent]) -> Result<usize> {
    let columns: Vec<String> = BRAND_ISSUE_COLUMNS.iter().map(|c| (*c).to_string()).collect();
    let brand_events: Vec<ExceptionEvent> = events
        .iter()
        .filter(|event| is_brand_issue(&event.issue_type))
        .cloned()
        .collect();
    write_csv_file(path, &columns, &event_rows(&brand_events, &columns))?;
    Ok(brand_events.len())
}

