//! Error types shared across Dealflow crates

use thiserror::Error;

/// Result type alias for common Dealflow operations
pub type Result<T> = std::result::Result<T, DealflowError>;

#[derive(Error, Debug)]
pub enum DealflowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Warehouse error: {0}")]
    Warehouse(#[from] sqlx::Error),
}
