//! Error types for Marga

use thiserror::Error;

/// Marga error type
///
/// Planning and execution never fail; these cover configuration and the
/// search worker's lifecycle.
#[derive(Error, Debug)]
pub enum MargaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search worker error: {0}")]
    Worker(String),
}

impl From<toml::de::Error> for MargaError {
    fn from(e: toml::de::Error) -> Self {
        MargaError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MargaError>;
