//! Cross-batch finalisation: column union, duplicate removal, mapping diff.

use std::collections::HashSet;

use tracing::debug;

use dcqa_model::Record;

/// Columns of the plans mapping diff, in output order.
pub const MAPPING_DIFF_COLUMNS: [&str; 11] = [
    "Plan ID",
    "Market",
    "Plan Name",
    "Brand",
    "Brand_clean",
    "Variant",
    "Variant_clean",
    "Vendor",
    "Vendor_clean",
    "Campaign Name",
    "Campaign_clean",
];

/// Field names across `records` in first-seen order.
pub fn union_columns(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for record in records {
        for name in record.names() {
            if seen.insert(name) {
                columns.push(name.to_string());
            }
        }
    }
    columns
}

fn rendered(record: &Record, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|column| record.get(column).map(ToString::to_string).unwrap_or_default())
        .collect()
}

/// Drops records whose rendered values equal an earlier record's over the
/// union of columns. A missing field renders like a blank one.
pub fn dedupe_records(records: Vec<Record>) -> Vec<Record> {
    let columns = union_columns(&records);
    let before = records.len();
    let mut seen = HashSet::new();
    let kept: Vec<Record> = records
        .into_iter()
        .filter(|record| seen.insert(rendered(record, &columns)))
        .collect();
    debug!(before, after = kept.len(), "dedupe");
    kept
}

/// Distinct raw-to-clean attribute combinations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingDiff {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl MappingDiff {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Mapping diff over the [`MAPPING_DIFF_COLUMNS`] present in `records`,
/// with distinct rows in first-seen order.
pub fn mapping_diff(records: &[Record]) -> MappingDiff {
    let columns: Vec<String> = MAPPING_DIFF_COLUMNS
        .iter()
        .filter(|column| records.iter().any(|record| record.contains(column)))
        .map(|column| (*column).to_string())
        .collect();
    let mut seen = HashSet::new();
    let rows = records
        .iter()
        .map(|record| rendered(record, &columns))
        .filter(|row| seen.insert(row.clone()))
        .collect();
    MappingDiff { columns, rows }
}

#[cfg(test)]
mod tests {
    use dcqa_model::Value;

    use super::*;

    #[test]
    fn union_keeps_first_seen_order() {
        let records = vec![
            Record::new(0).with("B", "1").with("A", "2"),
            Record::new(1).with("C", "3").with("A", "4"),
        ];
        assert_eq!(union_columns(&records), vec!["B", "A", "C"]);
    }

    #[test]
    fn duplicates_compare_rendered_values() {
        let records = vec![
            Record::new(0).with("Spend", 100.0).with("Market", "DK"),
            Record::new(1).with("Spend", "100").with("Market", "DK"),
            Record::new(2).with("Market", "DK").with("Spend", 100.0),
            Record::new(3).with("Spend", 100.0).with("Market", "DK").with("Note", Value::Null),
        ];
        let kept = dedupe_records(records);
        let rows: Vec<usize> = kept.iter().map(Record::row).collect();
        assert_eq!(rows, vec![0]);
    }

    #[test]
    fn mapping_diff_uses_present_columns() {
        let records = vec![
            Record::new(0).with("Market", "DK").with("Brand", "acme").with("Brand_clean", "Acme"),
            Record::new(1).with("Market", "DK").with("Brand", "acme").with("Brand_clean", "Acme"),
            Record::new(2).with("Market", "SE").with("Brand", "acme").with("Brand_clean", "Acme"),
        ];
        let diff = mapping_diff(&records);
        assert_eq!(diff.columns, vec!["Market", "Brand", "Brand_clean"]);
        assert_eq!(diff.rows.len(), 2);
        assert_eq!(diff.rows[1][0], "SE");
    }
}
