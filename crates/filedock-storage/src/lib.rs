//! Filedock Storage Library
//!
//! This crate provides the object storage abstraction used by the upload and
//! delete workflows, together with S3, local filesystem and in-memory backends.
//!
//! # Object key format
//!
//! Every object belongs to exactly one user and lives under
//! `users/{user_id}/{file_name}`. Keys must not contain `.` or `..` segments or
//! a leading `/`. Key generation is centralized in the `keys` module so every
//! backend and the workflow agree on the layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
pub mod progress;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signing;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use filedock_core::StorageBackend;
pub use keys::{user_object_key, validate_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use progress::ProgressReporter;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use signing::UrlSigner;
pub use traits::{ObjectStorage, TransferError, TransferResult};
