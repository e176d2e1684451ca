//! Filedock Core Library
//!
//! This crate provides the domain models, configuration, error metadata and
//! display formatting shared by every Filedock component.

pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{error_chain, ErrorMetadata, LogLevel};
pub use format::{format_bytes, format_bytes_with, format_upload_date};
pub use models::{
    FederatedProvider, FileListing, FileRecord, NewFileRecord, SelectedFile, Session,
    SignInMethod,
};
pub use storage_types::{MetadataBackend, StorageBackend};
