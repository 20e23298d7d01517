use service_core::error::AppError;
use std::time::Duration;
use thiserror::Error;

/// Failures of the primary document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("domain with key '{0}' already exists")]
    Conflict(String),

    #[error("store operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

/// Failures of the content-addressed fallback store.
#[derive(Debug, Error)]
pub enum ContentStoreError {
    #[error("invalid content store URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("content store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("content store answered {status} for '{key}'")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        key: String,
    },

    #[error("failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl From<ContentStoreError> for AppError {
    fn from(err: ContentStoreError) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}
