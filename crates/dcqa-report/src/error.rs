use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },
}

impl ReportError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, error: &csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
