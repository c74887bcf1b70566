//! Reference CSV reading and writing.
//!
//! Taxonomy files are maintained by hand in spreadsheet tools, so reading
//! accepts UTF-8 with or without a BOM and falls back to Windows-1252 when
//! the bytes are not valid UTF-8. Writing always produces UTF-8 with a BOM.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use encoding_rs::WINDOWS_1252;
use tracing::debug;

use dcqa_model::ReferenceTable;

use crate::error::{Result, TaxonomyError};

const BOM: &str = "\u{feff}";

/// Decodes file bytes as UTF-8, or Windows-1252 when that fails.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches(BOM).to_string(),
        Err(_) => {
            let (decoded, _, _) = WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

pub fn read_table(path: &Path, name: &str) -> Result<ReferenceTable> {
    let bytes = fs::read(path).map_err(|e| TaxonomyError::io(path, e))?;
    let text = decode_text(&bytes);
    let table = parse_table(name, &text).map_err(|e| TaxonomyError::csv(path, &e))?;
    debug!(
        table = name,
        path = %path.display(),
        rows = table.len(),
        columns = table.headers().len(),
        "loaded reference table"
    );
    Ok(table)
}

/// Parses CSV text with a header row. Short rows are padded with blanks.
pub fn parse_table(name: &str, text: &str) -> std::result::Result<ReferenceTable, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(ReferenceTable::new(name, headers, rows))
}

/// Writes `table` as UTF-8 CSV with a leading BOM.
pub fn write_table(path: &Path, table: &ReferenceTable) -> Result<()> {
    let to_error = |e: csv::Error| TaxonomyError::CsvWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(table.headers()).map_err(to_error)?;
    for row in table.raw_rows() {
        writer.write_record(row).map_err(to_error)?;
    }
    let body = writer.into_inner().map_err(|e| TaxonomyError::CsvWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut bytes = BOM.as_bytes().to_vec();
    bytes.extend_from_slice(&body);
    fs::write(path, bytes).map_err(|e| TaxonomyError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_bom_is_stripped() {
        let text = decode_text("\u{feff}brand,market\n".as_bytes());
        assert_eq!(text, "brand,market\n");
    }

    #[test]
    fn invalid_utf8_falls_back_to_cp1252() {
        let bytes = b"Caf\xe9 \x80 \x99 \x8a\x9c";
        assert_eq!(decode_text(bytes), "Café € ™ Šœ");
    }

    #[test]
    fn blank_rows_are_skipped_and_short_rows_padded() {
        let table = parse_table("vendors", "raw_vendor,vendor_clean\nfb,Meta\n,\nyt\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(1, "raw_vendor"), "yt");
        assert_eq!(table.value(1, "vendor_clean"), "");
    }
}
