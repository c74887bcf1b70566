use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown priority: {0}")]
    UnknownPriority(String),
    #[error("unknown owner: {0}")]
    UnknownOwner(String),
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
