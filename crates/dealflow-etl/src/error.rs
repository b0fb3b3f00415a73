//! Error types for the ETL pipeline

use crate::load::LoadError;

/// Result type for ETL operations
pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    /// The CRM answered with a non-success status.
    #[error("CRM request to {url} failed with status {status}")]
    ExternalFetch {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The CRM could not be reached or its body could not be decoded.
    #[error("CRM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<dealflow_common::DealflowError> for EtlError {
    fn from(err: dealflow_common::DealflowError) -> Self {
        EtlError::Config(err.to_string())
    }
}
