//! Filedock metadata store
//!
//! File metadata lives in one table (`files`), keyed by record id and queried
//! by owner. The [`FileRecordStore`] trait abstracts the store so the
//! workflow can run against PostgreSQL in production and an in-memory store in
//! tests and local development.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{
    connect, create_file_record_store, run_migrations, sort_by_recency, FileRecordStore,
    MemoryFileRecordStore, PostgresFileRecordStore,
};
