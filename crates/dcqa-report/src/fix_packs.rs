//! Review CSVs built from unresolved-mapping events.
//!
//! Each pack lists the distinct raw keys a reviewer has to map, using the
//! column names of the taxonomy table it will be merged into.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use dcqa_model::{ExceptionEvent, IssueType};

use crate::error::Result;
use crate::table::write_csv_file;

/// Extra event column holding the raw variant of a brand event.
const VARIANT_COLUMN: &str = "Variant";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixPack {
    pub file_name: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl FixPack {
    fn new(file_name: &'static str, headers: &'static [&'static str]) -> Self {
        Self {
            file_name,
            headers,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Key columns of a pack row for `event`, or `None` when the event does not
/// feed this pack or carries no raw value.
fn brand_row(event: &ExceptionEvent) -> Option<Vec<String>> {
    (event.issue_type == IssueType::BrandUnmapped && !event.current_value.trim().is_empty()).then(
        || {
            vec![
                event.market.clone(),
                event.current_value.clone(),
                event.column(VARIANT_COLUMN).into_owned(),
            ]
        },
    )
}

fn vendor_row(event: &ExceptionEvent) -> Option<Vec<String>> {
    (event.issue_type == IssueType::VendorUnmapped && !event.current_value.trim().is_empty())
        .then(|| vec![event.current_value.clone()])
}

fn channel_row(event: &ExceptionEvent) -> Option<Vec<String>> {
    if event.issue_type != IssueType::ChannelUnmapped {
        return None;
    }
    let (channel, sub_channel) = event
        .current_value
        .split_once('|')
        .unwrap_or((event.current_value.as_str(), ""));
    Some(vec![channel.to_string(), sub_channel.to_string()])
}

fn cbht_row(event: &ExceptionEvent) -> Option<Vec<String>> {
    (event.issue_type == IssueType::CbhtMissing && !event.current_value.trim().is_empty()).then(
        || {
            vec![
                event.current_value.clone(),
                event.market.clone(),
                event.fx_year.clone(),
            ]
        },
    )
}

type RowFn = fn(&ExceptionEvent) -> Option<Vec<String>>;

const PACKS: [(&str, &[&str], RowFn); 4] = [
    ("todo_brands.csv", &["market", "raw_brand", "raw_variant"], brand_row),
    ("todo_vendors.csv", &["raw_vendor"], vendor_row),
    ("todo_channels.csv", &["Channel", "Sub-Channel"], channel_row),
    ("todo_cbht.csv", &["brand", "market", "fx_year"], cbht_row),
];

/// All four packs, each with distinct rows in first-seen order.
pub fn build_fix_packs(events: &[ExceptionEvent]) -> Vec<FixPack> {
    PACKS
        .iter()
        .map(|&(file_name, headers, row_of)| {
            let mut pack = FixPack::new(file_name, headers);
            let mut seen = HashSet::new();
            for row in events.iter().filter_map(row_of) {
                if seen.insert(row.clone()) {
                    pack.rows.push(row);
                }
            }
            debug!(file = pack.file_name, rows = pack.rows.len(), "fix pack built");
            pack
        })
        .collect()
}

/// Writes the non-empty packs into `dir` and returns their paths.
pub fn write_fix_packs(dir: &Path, packs: &[FixPack]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for pack in packs.iter().filter(|pack| !pack.is_empty()) {
        let path = dir.join(pack.file_name);
        write_csv_file(&path, pack.headers, &pack.rows)?;
        info!(path = %path.display(), rows = pack.rows.len(), "wrote fix pack");
        written.push(path);
    }
    Ok(written)
}
