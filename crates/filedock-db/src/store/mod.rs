//! File record stores.

mod memory;
mod postgres;

pub use memory::MemoryFileRecordStore;
pub use postgres::{connect, run_migrations, PostgresFileRecordStore};

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use filedock_core::{Config, FileRecord, MetadataBackend, NewFileRecord};
use std::cmp::Reverse;
use std::sync::Arc;
use uuid::Uuid;

/// Trait for file metadata operations
///
/// Implementations only filter by owner; ordering is applied afterwards with
/// [`sort_by_recency`].
#[async_trait]
pub trait FileRecordStore: Send + Sync {
    /// Insert a record; the store assigns the id and the creation timestamp.
    async fn create_record(&self, record: NewFileRecord) -> StoreResult<Uuid>;

    /// Every record owned by `user_id`, newest first.
    async fn list_records(&self, user_id: &str) -> StoreResult<Vec<FileRecord>>;

    async fn get_record(&self, id: Uuid) -> StoreResult<Option<FileRecord>>;

    /// Fails with [`StoreError::NotFound`] when no record has this id.
    async fn delete_record(&self, id: Uuid) -> StoreResult<()>;

    /// Change the display name. The storage key is never touched.
    async fn rename_record(&self, id: Uuid, new_name: &str) -> StoreResult<()>;
}

/// Order records by `created_at` descending.
///
/// Records without a timestamp count as time zero and therefore come last;
/// the sort is stable so equal timestamps keep their query order.
pub fn sort_by_recency(records: &mut [FileRecord]) {
    records.sort_by_key(|record| {
        Reverse(
            record
                .created_at
                .map(|created_at| created_at.timestamp_micros())
                .unwrap_or(0),
        )
    });
}

pub(crate) fn validate_new_record(record: &NewFileRecord) -> StoreResult<()> {
    if record.user_id.trim().is_empty() {
        return Err(StoreError::InvalidRecord("owner is missing".to_string()));
    }
    if record.name.trim().is_empty() {
        return Err(StoreError::InvalidRecord("file name is empty".to_string()));
    }
    if record.storage_key.is_empty() {
        return Err(StoreError::InvalidRecord("storage key is empty".to_string()));
    }
    if record.size < 0 {
        return Err(StoreError::InvalidRecord(format!(
            "negative file size {}",
            record.size
        )));
    }
    Ok(())
}

/// Create the metadata store selected by configuration.
///
/// The PostgreSQL store connects and applies pending migrations before it is
/// returned.
pub async fn create_file_record_store(config: &Config) -> StoreResult<Arc<dyn FileRecordStore>> {
    match config.metadata_backend {
        MetadataBackend::Postgres => {
            let pool = connect(config).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(PostgresFileRecordStore::new(pool)))
        }
        MetadataBackend::Memory => Ok(Arc::new(MemoryFileRecordStore::new())),
    }
}
