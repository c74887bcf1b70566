//! Row rendering and CSV output shared by every artifact.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use dcqa_model::{Record, Value};

use crate::error::{ReportError, Result};

const BOM: &[u8] = b"\xef\xbb\xbf";

/// Cell text for an artifact. `NaN` renders empty.
pub fn render(value: &Value) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// `records` laid out over `columns`; missing fields render empty.
pub fn record_rows(records: &[Record], columns: &[String]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| record.get(column).map(render).unwrap_or_default())
                .collect()
        })
        .collect()
}

/// Writes a header plus rows as CSV.
pub fn write_rows<W: Write, H: AsRef<str>>(
    writer: W,
    headers: &[H],
    rows: &[Vec<String>],
) -> std::result::Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    csv_writer.write_record(headers.iter().map(AsRef::as_ref))?;
    for row in rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// BOM-prefixed CSV file, creating parent directories as needed.
pub fn write_csv_file<H: AsRef<str>>(path: &Path, headers: &[H], rows: &[Vec<String>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ReportError::io(path, e))?;
    }
    let mut file = io::BufWriter::new(fs::File::create(path).map_err(|e| ReportError::io(path, e))?);
    file.write_all(BOM).map_err(|e| ReportError::io(path, e))?;
    write_rows(&mut file, headers, rows).map_err(|e| ReportError::csv(path, &e))?;
    file.flush().map_err(|e| ReportError::io(path, e))
}

/// Cleaned records over `columns`.
pub fn write_records(path: &Path, columns: &[String], records: &[Record]) -> Result<()> {
    write_csv_file(path, columns, &record_rows(records, columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_and_missing_fields_render_empty() {
        let records = vec![
            Record::new(0).with("A", f64::NAN).with("B", 2.5),
            Record::new(1).with("B", "x"),
        ];
        let columns = vec!["A".to_string(), "B".to_string()];
        assert_eq!(
            record_rows(&records, &columns),
            vec![vec![String::new(), "2.5".to_string()], vec![String::new(), "x".to_string()]]
        );
    }

    #[test]
    fn files_start_with_a_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        write_csv_file(&path, &["A"], &[vec!["1".to_string()]]).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(BOM));
        assert_eq!(&bytes[BOM.len()..], b"A\n1\n");
    }
}
