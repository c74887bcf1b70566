//! Raw CSV reading with header-row detection.
//!
//! Spreadsheet exports often carry title rows above the real header. The
//! header is the first of the leading rows that mentions one of the expected
//! plan keywords; without any hit the first row is used.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use csv::ReaderBuilder;

use dcqa_taxonomy::decode_text;
use dcqa_transform::normalization::normalize_header;

use crate::error::{IngestError, Result};

/// Rows inspected when looking for the header.
pub const HEADER_PROBE_ROWS: usize = 30;

const HEADER_KEYWORDS: [&str; 7] = ["plan", "market", "brand", "start", "end", "currency", "vendor"];

#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Index of the header row among `rows`.
pub fn detect_header_row(rows: &[Vec<String>]) -> usize {
    rows.iter()
        .take(HEADER_PROBE_ROWS)
        .position(|row| {
            let joined = row
                .iter()
                .map(|cell| cell.trim().to_lowercase())
                .collect::<Vec<_>>()
                .join(" ");
            HEADER_KEYWORDS.iter().any(|keyword| joined.contains(keyword))
        })
        .unwrap_or(0)
}

/// Collapses whitespace and suffixes repeated names as `name__1`, `name__2`.
pub fn dedupe_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .map(|name| {
            let name = normalize_header(name.as_ref());
            match seen.get_mut(&name) {
                Some(count) => {
                    *count += 1;
                    format!("{name}__{count}")
                }
                None => {
                    seen.insert(name.clone(), 0);
                    name
                }
            }
        })
        .collect()
}

pub fn parse_csv_table(text: &str) -> std::result::Result<CsvTable, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<String> = record.iter().map(normalize_cell).collect();
        if row.iter().all(|value| value.is_empty()) {
            continue;
        }
        raw_rows.push(row);
    }
    if raw_rows.is_empty() {
        return Ok(CsvTable::default());
    }

    let header_index = detect_header_row(&raw_rows);
    let headers = dedupe_headers(&raw_rows[header_index]);
    let rows = raw_rows
        .iter()
        .skip(header_index + 1)
        .map(|record| {
            (0..headers.len())
                .map(|idx| record.get(idx).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    Ok(CsvTable { headers, rows })
}

pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let bytes = fs::read(path).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_csv_table(&decode_text(&bytes)).map_err(|e| IngestError::CsvParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_rows_above_header_are_skipped() {
        let table = parse_csv_table(
            "Quarterly Export,,\nGenerated 2024-03-01,,\nPlan ID,Market,Brand\nP1,DK,Acme\n",
        )
        .unwrap();
        assert_eq!(table.headers, vec!["Plan ID", "Market", "Brand"]);
        assert_eq!(table.rows, vec![vec!["P1", "DK", "Acme"]]);
    }

    #[test]
    fn repeated_headers_get_suffixes() {
        let headers = dedupe_headers(["Cost", "Cost ", "Market", "Cost"]);
        assert_eq!(headers, vec!["Cost", "Cost__1", "Market", "Cost__2"]);
    }

    #[test]
    fn header_whitespace_is_collapsed() {
        let table = parse_csv_table("Plan   Name,Start\u{a0}Date\nX,01/02/2024\n").unwrap();
        assert_eq!(table.headers, vec!["Plan Name", "Start Date"]);
    }

    #[test]
    fn without_keywords_the_first_row_is_the_header() {
        let table = parse_csv_table("a,b\n1,2\n").unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows.len(), 1);
    }
}
