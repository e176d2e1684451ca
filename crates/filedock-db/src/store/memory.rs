use super::{sort_by_recency, validate_new_record, FileRecordStore};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use filedock_core::{FileRecord, NewFileRecord};
use std::sync::Arc;
use uuid::Uuid;

/// In-process file record store. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileRecordStore {
    records: Arc<DashMap<Uuid, FileRecord>>,
}

impl MemoryFileRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed record, keeping its id and timestamp.
    pub fn insert(&self, record: FileRecord) {
        self.records.insert(record.id, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl FileRecordStore for MemoryFileRecordStore {
    async fn create_record(&self, record: NewFileRecord) -> StoreResult<Uuid> {
        validate_new_record(&record)?;

        let id = Uuid::new_v4();
        self.records.insert(
            id,
            FileRecord {
                id,
                user_id: record.user_id,
                name: record.name,
                size: record.size,
                content_type: record.content_type,
                storage_key: record.storage_key,
                created_at: Some(Utc::now()),
            },
        );
        tracing::debug!(record_id = %id, "File record created");
        Ok(id)
    }

    async fn list_records(&self, user_id: &str) -> StoreResult<Vec<FileRecord>> {
        let mut records: Vec<FileRecord> = self
            .records
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        sort_by_recency(&mut records);
        Ok(records)
    }

    async fn get_record(&self, id: Uuid) -> StoreResult<Option<FileRecord>> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn delete_record(&self, id: Uuid) -> StoreResult<()> {
        self.records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn rename_record(&self, id: Uuid, new_name: &str) -> StoreResult<()> {
        if new_name.trim().is_empty() {
            return Err(StoreError::InvalidRecord("file name is empty".to_string()));
        }
        let mut record = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.name = new_name.to_string();
        Ok(())
    }
}
