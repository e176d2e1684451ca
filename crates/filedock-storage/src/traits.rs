//! Object storage abstraction trait
//!
//! This module defines the `ObjectStorage` trait that every backend implements
//! and the `TransferError` type the workflow surfaces on a failed transfer.

use crate::progress::ProgressReporter;
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use filedock_core::{ErrorMetadata, LogLevel};
use std::time::Duration;
use thiserror::Error;

/// Object storage operation errors
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("URL signing failed: {0}")]
    Signing(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for object storage operations
pub type TransferResult<T> = Result<T, TransferError>;

impl ErrorMetadata for TransferError {
    fn error_code(&self) -> &'static str {
        match self {
            TransferError::UploadFailed(_) => "UPLOAD_FAILED",
            TransferError::DeleteFailed(_) => "DELETE_FAILED",
            TransferError::NotFound(_) => "OBJECT_NOT_FOUND",
            TransferError::InvalidKey(_) => "INVALID_STORAGE_KEY",
            TransferError::Signing(_) => "URL_SIGNING_FAILED",
            TransferError::Backend(_) | TransferError::Io(_) => "STORAGE_ERROR",
            TransferError::Config(_) => "STORAGE_CONFIG_ERROR",
        }
    }

    fn client_message(&self) -> String {
        match self {
            TransferError::UploadFailed(msg) => msg.clone(),
            TransferError::DeleteFailed(msg) => format!("Failed to delete from cloud: {}", msg),
            TransferError::NotFound(_) => "The file no longer exists in cloud storage".to_string(),
            TransferError::InvalidKey(msg) => msg.clone(),
            TransferError::Signing(_) => "Could not create a download link".to_string(),
            TransferError::Backend(_) | TransferError::Io(_) => {
                "Failed to access cloud storage".to_string()
            }
            TransferError::Config(_) => "Cloud storage is not configured".to_string(),
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            TransferError::UploadFailed(_) => Some("Check your connection and upload the file again"),
            TransferError::InvalidKey(_) => Some("Rename the file without path separators"),
            TransferError::Config(_) => Some("Contact your administrator"),
            _ => Some("Try again in a moment"),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            TransferError::InvalidKey(_) | TransferError::NotFound(_) => LogLevel::Debug,
            _ => LogLevel::Error,
        }
    }
}

/// Object storage abstraction trait
///
/// All backends (S3, local filesystem, in-memory) implement this trait so the
/// workflow coordinator never couples to a specific provider.
///
/// **Key format:** `users/{user_id}/{file_name}`. See the crate root documentation.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload `body` under `key`.
    ///
    /// Progress is reported through `progress` as a percentage, zero or more
    /// times, before the call resolves.
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        progress: &ProgressReporter,
    ) -> TransferResult<()>;

    /// Delete the object stored under `key`.
    ///
    /// Fails with [`TransferError::NotFound`] when no such object exists.
    async fn delete_object(&self, key: &str) -> TransferResult<()>;

    /// Generate a time-limited download URL.
    ///
    /// Does not check that the object exists.
    async fn signed_url(&self, key: &str, expires_in: Duration) -> TransferResult<String>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> TransferResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
