use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON in manifest {file}: {message}")]
    InvalidJson { file: PathBuf, message: String },
}

#[derive(Debug, Error)]
pub enum GraphEngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid query: {0}")]
    Query(String),

    #[error("Export error: {0}")]
    Export(String),
}
