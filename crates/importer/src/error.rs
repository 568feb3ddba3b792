use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImporterError>;

#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("Failed to read snapshot: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid snapshot JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] engine::StorageError),

    #[error("Snapshot record rejected: {0}")]
    EngineError(#[from] engine::EngineError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
