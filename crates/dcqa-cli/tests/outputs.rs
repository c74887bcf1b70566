//! Artifact writing for the `prorate` command.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tempfile::TempDir;

use dcqa_cli::outputs::{prorate_file, review_path, stamp};
use dcqa_transform::ProrationLayout;

fn lines(path: &Path) -> Vec<String> {
    let text = fs::read_to_string(path).unwrap();
    text.trim_start_matches('\u{feff}')
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn stamp_uses_iso_dates() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    assert_eq!(stamp(date), "2024-03-09");
}

#[test]
fn review_file_sits_next_to_output() {
    let path = review_path(Path::new("out/budgets_daily.csv"));
    assert_eq!(path, Path::new("out/budgets_daily_manual_review.csv"));
}

#[test]
fn prorate_spreads_budgets_and_routes_undated_rows_to_review() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("Budgets_Clean.csv");
    fs::write(
        &input,
        "\u{feff}Market,Min Start Date,Max End Date,Planned (Local)\n\
         DK,2024-01-01,2024-01-04,400\n\
         SE,,,50\n",
    )
    .unwrap();
    let output = dir.path().join("daily.csv");

    let result = prorate_file(&input, &ProrationLayout::budgets(), &output).unwrap();
    assert_eq!(result.input_rows, 2);
    assert_eq!(result.daily_rows, 5);
    assert_eq!(result.ledger.len(), 1);

    let daily = lines(&output);
    assert_eq!(daily[0], "Market,Min Start Date,Max End Date,Date,Planned (Local)");
    assert_eq!(daily[1], "DK,2024-01-01,2024-01-04,2024-01-01,100");
    assert_eq!(daily[4], "DK,2024-01-01,2024-01-04,2024-01-04,100");
    assert_eq!(daily[5], "SE,,,,0");

    let review = result.review.unwrap();
    assert_eq!(review, review_path(&output));
    let review_lines = lines(&review);
    assert_eq!(review_lines.len(), 2);
    assert_eq!(review_lines[1], "SE,,,50");
}

#[test]
fn fully_dated_input_writes_no_review_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("Budgets_Clean.csv");
    fs::write(
        &input,
        "Market,Min Start Date,Max End Date,Planned (Local)\nDK,2024-02-01,2024-02-02,10\n",
    )
    .unwrap();
    let output = dir.path().join("daily.csv");

    let result = prorate_file(&input, &ProrationLayout::budgets(), &output).unwrap();
    assert_eq!(result.daily_rows, 2);
    assert!(result.review.is_none());
    assert!(!review_path(&output).exists());
}
