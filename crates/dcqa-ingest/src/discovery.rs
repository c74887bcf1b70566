//! Raw batch discovery under `input/raw/`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{IngestError, Result};

/// Which pipeline a raw file feeds, decided by its file-name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Plans,
    Budgets,
}

impl BatchKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Plans => "plans_",
            Self::Budgets => "budgets_",
        }
    }

    /// Case-insensitive prefix match on the file name; spreadsheet lock
    /// files (`~$...`) never match.
    pub fn matches(&self, file_name: &str) -> bool {
        if file_name.starts_with("~$") {
            return false;
        }
        file_name
            .get(..self.prefix().len())
            .is_some_and(|head| head.eq_ignore_ascii_case(self.prefix()))
    }
}

/// Lists all CSV files in a directory, sorted by file name.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let entries = fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Batch files of `kind` in `dir`, sorted by file name.
pub fn discover_batches(dir: &Path, kind: BatchKind) -> Result<Vec<PathBuf>> {
    Ok(list_csv_files(dir)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| kind.matches(name))
        })
        .collect())
}

/// Most recently modified batch file of `kind`, if any.
pub fn latest_batch(dir: &Path, kind: BatchKind) -> Result<Option<PathBuf>> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for path in discover_batches(dir, kind)? {
        let modified = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .map_err(|e| IngestError::FileRead {
                path: path.clone(),
                source: e,
            })?;
        if newest.as_ref().is_none_or(|(time, _)| modified >= *time) {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_match_ignores_case_and_lock_files() {
        assert!(BatchKind::Plans.matches("plans_2024_q1.csv"));
        assert!(BatchKind::Plans.matches("Plans_2024.csv"));
        assert!(!BatchKind::Plans.matches("~$plans_2024.csv"));
        assert!(!BatchKind::Plans.matches("budgets_2024.csv"));
        assert!(BatchKind::Budgets.matches("BUDGETS_FY25.csv"));
        assert!(!BatchKind::Budgets.matches("bud.csv"));
    }
}
