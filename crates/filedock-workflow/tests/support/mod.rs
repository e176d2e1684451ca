//! Recording test doubles for the storage and metadata adapters.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use filedock_core::{FileRecord, NewFileRecord, SignInMethod, Session};
use filedock_db::{FileRecordStore, MemoryFileRecordStore, StoreError, StoreResult};
use filedock_storage::{
    MemoryStorage, ObjectStorage, ProgressReporter, StorageBackend, TransferError, TransferResult,
};
use filedock_workflow::FileCoordinator;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Adapter calls in the order they were made, shared by both doubles.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

#[derive(Debug, Default)]
struct Failures {
    put: Option<String>,
    delete: Option<String>,
    sign: Option<String>,
}

/// [`MemoryStorage`] that records calls and fails on request.
///
/// With a latency set, puts and deletes sleep before completing and log a
/// second `... done` entry, so overlapping calls show up interleaved.
#[derive(Clone)]
pub struct RecordingStorage {
    pub inner: MemoryStorage,
    log: CallLog,
    failures: Arc<Mutex<Failures>>,
    latency: Arc<Mutex<Option<Duration>>>,
}

impl RecordingStorage {
    pub fn new(log: CallLog) -> Self {
        Self {
            inner: MemoryStorage::ephemeral(),
            log,
            failures: Arc::default(),
            latency: Arc::default(),
        }
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    async fn wait_and_log(&self, call: String) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
            self.log.push(format!("{} done", call));
        }
    }

    pub fn fail_put(&self, message: &str) {
        self.failures.lock().unwrap().put = Some(message.to_string());
    }

    pub fn fail_delete(&self, message: &str) {
        self.failures.lock().unwrap().delete = Some(message.to_string());
    }

    pub fn fail_sign(&self, message: &str) {
        self.failures.lock().unwrap().sign = Some(message.to_string());
    }
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        progress: &ProgressReporter,
    ) -> TransferResult<()> {
        self.log.push(format!("put_object {}", key));
        let failure = self.failures.lock().unwrap().put.clone();
        if let Some(msg) = failure {
            progress.report(30);
            return Err(TransferError::UploadFailed(msg));
        }
        self.wait_and_log(format!("put_object {}", key)).await;
        self.inner.put_object(key, body, content_type, progress).await
    }

    async fn delete_object(&self, key: &str) -> TransferResult<()> {
        self.log.push(format!("delete_object {}", key));
        let failure = self.failures.lock().unwrap().delete.clone();
        if let Some(msg) = failure {
            return Err(TransferError::DeleteFailed(msg));
        }
        self.wait_and_log(format!("delete_object {}", key)).await;
        self.inner.delete_object(key).await
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> TransferResult<String> {
        let failure = self.failures.lock().unwrap().sign.clone();
        if let Some(msg) = failure {
            return Err(TransferError::Signing(msg));
        }
        self.inner.signed_url(key, expires_in).await
    }

    async fn exists(&self, key: &str) -> TransferResult<bool> {
        self.inner.exists(key).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[derive(Debug, Default)]
struct StoreFailures {
    create: Option<String>,
    delete: Option<String>,
    rename: Option<String>,
    list: Option<String>,
}

/// [`MemoryFileRecordStore`] that records calls and fails on request.
#[derive(Clone)]
pub struct RecordingStore {
    pub inner: MemoryFileRecordStore,
    log: CallLog,
    failures: Arc<Mutex<StoreFailures>>,
}

impl RecordingStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            inner: MemoryFileRecordStore::new(),
            log,
            failures: Arc::default(),
        }
    }

    pub fn fail_create(&self, message: &str) {
        self.failures.lock().unwrap().create = Some(message.to_string());
    }

    pub fn fail_delete(&self, message: &str) {
        self.failures.lock().unwrap().delete = Some(message.to_string());
    }

    pub fn fail_rename(&self, message: &str) {
        self.failures.lock().unwrap().rename = Some(message.to_string());
    }

    pub fn fail_list(&self, message: &str) {
        self.failures.lock().unwrap().list = Some(message.to_string());
    }
}

#[async_trait]
impl FileRecordStore for RecordingStore {
    async fn create_record(&self, record: NewFileRecord) -> StoreResult<Uuid> {
        self.log.push(format!("create_record {}", record.storage_key));
        let failure = self.failures.lock().unwrap().create.clone();
        if let Some(msg) = failure {
            return Err(StoreError::Write(msg));
        }
        self.inner.create_record(record).await
    }

    async fn list_records(&self, user_id: &str) -> StoreResult<Vec<FileRecord>> {
        self.log.push(format!("list_records {}", user_id));
        let failure = self.failures.lock().unwrap().list.clone();
        if let Some(msg) = failure {
            return Err(StoreError::Write(msg));
        }
        self.inner.list_records(user_id).await
    }

    async fn get_record(&self, id: Uuid) -> StoreResult<Option<FileRecord>> {
        self.inner.get_record(id).await
    }

    async fn delete_record(&self, id: Uuid) -> StoreResult<()> {
        self.log.push(format!("delete_record {}", id));
        let failure = self.failures.lock().unwrap().delete.clone();
        if let Some(msg) = failure {
            return Err(StoreError::Write(msg));
        }
        self.inner.delete_record(id).await
    }

    async fn rename_record(&self, id: Uuid, new_name: &str) -> StoreResult<()> {
        self.log.push(format!("rename_record {} {}", id, new_name));
        let failure = self.failures.lock().unwrap().rename.clone();
        if let Some(msg) = failure {
            return Err(StoreError::Write(msg));
        }
        self.inner.rename_record(id, new_name).await
    }
}

pub struct Harness {
    pub coordinator: FileCoordinator,
    pub storage: RecordingStorage,
    pub records: RecordingStore,
    pub log: CallLog,
}

pub fn harness() -> Harness {
    let log = CallLog::default();
    let storage = RecordingStorage::new(log.clone());
    let records = RecordingStore::new(log.clone());
    let coordinator = FileCoordinator::new(Arc::new(storage.clone()), Arc::new(records.clone()));
    Harness {
        coordinator,
        storage,
        records,
        log,
    }
}

pub fn session(user_id: &str) -> Session {
    Session::new(user_id, Some(format!("{}@example.com", user_id)), SignInMethod::Password)
}
