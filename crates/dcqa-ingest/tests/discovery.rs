//! Batch discovery and loading from a raw input directory.

use std::fs;
use std::path::Path;

use dcqa_ingest::{BatchKind, IngestError, discover_batches, load_batch};
use tempfile::TempDir;

fn touch(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

#[test]
fn batches_are_split_by_prefix() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "plans_2024_b.csv", "Plan ID\n");
    touch(dir.path(), "Plans_2024_a.csv", "Plan ID\n");
    touch(dir.path(), "budgets_2024.csv", "Market\n");
    touch(dir.path(), "notes.txt", "ignore me");
    touch(dir.path(), "~$plans_2024.csv", "");

    let plans = discover_batches(dir.path(), BatchKind::Plans).unwrap();
    let names: Vec<_> = plans
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["Plans_2024_a.csv", "plans_2024_b.csv"]);
    assert_eq!(discover_batches(dir.path(), BatchKind::Budgets).unwrap().len(), 1);
}

#[test]
fn missing_directory_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = discover_batches(&dir.path().join("raw"), BatchKind::Plans).unwrap_err();
    assert!(matches!(err, IngestError::DirectoryNotFound { .. }));
}

#[test]
fn loaded_plan_batch_carries_expected_columns() {
    let dir = TempDir::new().unwrap();
    touch(
        dir.path(),
        "plans_2024.csv",
        "Exported by ops tool,,\nPlan ID,Market,Plan  Name,Market\nP1,DK,Spring,DK2\n",
    );
    let batch = load_batch(&dir.path().join("plans_2024.csv"), BatchKind::Plans).unwrap();
    assert_eq!(batch.records.len(), 1);
    let record = &batch.records[0];
    assert_eq!(record.text("Plan Name"), "Spring");
    assert_eq!(record.text("Market__1"), "DK2");
    assert_eq!(record.text("FX_Year"), "2024");
    assert!(record.is_blank("Vendor"));
}
