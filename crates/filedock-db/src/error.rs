use filedock_core::{ErrorMetadata, LogLevel};
use thiserror::Error;
use uuid::Uuid;

/// Metadata store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File record not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to write file record: {0}")]
    Write(String),

    #[error("Invalid file record: {0}")]
    InvalidRecord(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl ErrorMetadata for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "RECORD_NOT_FOUND",
            StoreError::Database(_) => "STORE_ERROR",
            StoreError::Write(_) => "STORE_WRITE_FAILED",
            StoreError::InvalidRecord(_) => "INVALID_RECORD",
        }
    }

    fn client_message(&self) -> String {
        match self {
            StoreError::NotFound(_) => "The file details no longer exist".to_string(),
            StoreError::Database(_) => "Failed to reach the file database".to_string(),
            StoreError::Write(msg) => format!("Failed to save file details: {}", msg),
            StoreError::InvalidRecord(msg) => msg.clone(),
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            StoreError::NotFound(_) => Some("Refresh the file list"),
            StoreError::InvalidRecord(_) => None,
            _ => Some("Try again in a moment"),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            StoreError::NotFound(_) | StoreError::InvalidRecord(_) => LogLevel::Debug,
            _ => LogLevel::Error,
        }
    }
}
