//! Merging reviewed fix-pack CSVs back into the taxonomy.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use dcqa_model::ReferenceTable;

use crate::csv_io::{read_table, write_table};
use crate::error::Result;
use crate::taxonomy::TaxonomyFile;

/// A reviewed todo file and the taxonomy table it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixTarget {
    pub todo_file: &'static str,
    pub taxonomy: TaxonomyFile,
    pub keys: &'static [&'static str],
}

pub const FIX_TARGETS: [FixTarget; 4] = [
    FixTarget {
        todo_file: "todo_brands.csv",
        taxonomy: TaxonomyFile::Brands,
        keys: &["market", "raw_brand", "raw_variant"],
    },
    FixTarget {
        todo_file: "todo_vendors.csv",
        taxonomy: TaxonomyFile::Vendors,
        keys: &["raw_vendor"],
    },
    FixTarget {
        todo_file: "todo_channels.csv",
        taxonomy: TaxonomyFile::Channels,
        keys: &["Channel", "Sub-Channel"],
    },
    FixTarget {
        todo_file: "todo_cbht.csv",
        taxonomy: TaxonomyFile::Cbht,
        keys: &["brand", "market", "fx_year"],
    },
];

/// Outcome of one merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedFix {
    pub taxonomy: TaxonomyFile,
    pub added: usize,
    pub total: usize,
}

/// Appends rows of `incoming` whose key is not yet present in `existing`.
///
/// Columns are unioned in first-seen order (existing columns first). Rows of
/// `existing` always win; among incoming rows the first occurrence of a key
/// wins.
pub fn append_unique(
    existing: &ReferenceTable,
    incoming: &ReferenceTable,
    keys: &[&str],
) -> ReferenceTable {
    let mut headers: Vec<String> = existing.headers().to_vec();
    for header in incoming.headers() {
        if !headers.contains(header) {
            headers.push(header.clone());
        }
    }
    let key_of = |table: &ReferenceTable, row: usize| -> Vec<String> {
        keys.iter()
            .map(|key| table.value(row, key).to_string())
            .collect()
    };

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(existing.len() + incoming.len());
    for table in [existing, incoming] {
        for row in 0..table.len() {
            if !seen.insert(key_of(table, row)) {
                continue;
            }
            rows.push(
                headers
                    .iter()
                    .map(|header| table.value(row, header).to_string())
                    .collect(),
            );
        }
    }
    ReferenceTable::new(existing.name(), headers, rows)
}

/// Merges every present todo file under `fixes_dir` into `taxonomy_dir`.
pub fn apply_fixes(fixes_dir: &Path, taxonomy_dir: &Path) -> Result<Vec<AppliedFix>> {
    let mut applied = Vec::new();
    for target in FIX_TARGETS {
        let todo_path = fixes_dir.join(target.todo_file);
        if !todo_path.is_file() {
            continue;
        }
        let incoming = read_table(&todo_path, target.todo_file)?;
        let dest = target.taxonomy.path_in(taxonomy_dir);
        let existing = if dest.is_file() {
            read_table(&dest, target.taxonomy.name())?
        } else {
            warn!(path = %dest.display(), "taxonomy file missing, creating it");
            ReferenceTable::new(target.taxonomy.name(), Vec::new(), Vec::new())
        };
        let merged = append_unique(&existing, &incoming, target.keys);
        write_table(&dest, &merged)?;
        let fix = AppliedFix {
            taxonomy: target.taxonomy,
            added: merged.len() - existing.len(),
            total: merged.len(),
        };
        info!(
            table = %fix.taxonomy,
            added = fix.added,
            total = fix.total,
            "applied fixes"
        );
        applied.push(fix);
    }
    Ok(applied)
}
