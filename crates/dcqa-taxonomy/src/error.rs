use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rules file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("failed to write CSV {path}: {message}")]
    CsvWrite { path: PathBuf, message: String },

    #[error("required reference table {name} not found at {path}")]
    MissingTable { name: String, path: PathBuf },
}

impl TaxonomyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, error: &csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaxonomyError>;
