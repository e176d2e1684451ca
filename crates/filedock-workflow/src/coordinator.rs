//! Upload, rename, delete and list workflows.
//!
//! Upload writes the object first and the metadata record second; delete
//! removes the object first and the record second. A failure in the second
//! step is reported as an [`InconsistencyWarning`] and never rolled back or
//! retried.

use crate::confirm::{delete_prompt, Confirmation};
use crate::error::{InconsistencyWarning, WorkflowError, WorkflowResult};
use crate::locks::KeyedLocks;
use crate::state::{
    DeleteOutcome, DeleteState, RenameOutcome, RenameState, UploadOutcome, UploadState,
};
use filedock_core::constants::DEFAULT_SIGNED_URL_EXPIRY_SECS;
use filedock_core::{
    format_bytes, Config, FileListing, FileRecord, NewFileRecord, SelectedFile, Session,
};
use filedock_db::{create_file_record_store, FileRecordStore};
use filedock_identity::AuthError;
use filedock_storage::{
    create_storage, user_object_key, ObjectStorage, ProgressReporter, TransferError,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

const DEFAULT_MAX_UPLOAD_SIZE_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Lifetime of the download URLs attached to a listing.
    pub signed_url_expiry: Duration,
    /// Larger uploads are rejected before anything is written.
    pub max_upload_size_bytes: u64,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            signed_url_expiry: Duration::from_secs(DEFAULT_SIGNED_URL_EXPIRY_SECS),
            max_upload_size_bytes: DEFAULT_MAX_UPLOAD_SIZE_BYTES,
        }
    }
}

impl CoordinatorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            signed_url_expiry: config.signed_url_expiry(),
            max_upload_size_bytes: config.max_upload_size_bytes,
        }
    }
}

/// An upload running in the background.
#[derive(Debug)]
pub struct UploadTask {
    pub task_id: Uuid,
    pub session_id: Uuid,
    pub file_name: String,
    pub size: u64,
    progress: watch::Receiver<u8>,
    handle: JoinHandle<UploadOutcome>,
}

impl UploadTask {
    /// Percent complete, 0 to 100.
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress.clone()
    }

    /// Wait for the upload to finish. Dropping the task instead lets the
    /// upload run to completion unobserved.
    pub async fn wait(self) -> WorkflowResult<UploadOutcome> {
        self.handle
            .await
            .map_err(|e| WorkflowError::Task(e.to_string()))
    }
}

/// Runs file workflows against an object store and a metadata store.
///
/// Rename and delete on the same record, and uploads or deletes on the same
/// storage key, run one at a time. Everything else runs concurrently.
#[derive(Clone)]
pub struct FileCoordinator {
    storage: Arc<dyn ObjectStorage>,
    records: Arc<dyn FileRecordStore>,
    settings: CoordinatorSettings,
    record_locks: KeyedLocks,
    key_locks: KeyedLocks,
}

impl FileCoordinator {
    pub fn new(storage: Arc<dyn ObjectStorage>, records: Arc<dyn FileRecordStore>) -> Self {
        Self {
            storage,
            records,
            settings: CoordinatorSettings::default(),
            record_locks: KeyedLocks::new(),
            key_locks: KeyedLocks::new(),
        }
    }

    pub fn with_settings(mut self, settings: CoordinatorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the storage and metadata backends selected by `config`.
    pub async fn from_config(config: &Config) -> WorkflowResult<Self> {
        let storage = create_storage(config).await?;
        let records = create_file_record_store(config).await?;
        tracing::info!(
            storage_backend = %config.storage_backend,
            metadata_backend = %config.metadata_backend,
            "File coordinator initialized"
        );
        Ok(Self::new(storage, records).with_settings(CoordinatorSettings::from_config(config)))
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    fn require_session(session: Option<&Session>) -> WorkflowResult<&Session> {
        session.ok_or(WorkflowError::Auth(AuthError::NotSignedIn))
    }

    /// Upload `file` and record its metadata, reporting progress through
    /// `progress`.
    ///
    /// Fails only when no session is given; every other failure is part of
    /// the returned outcome.
    pub async fn upload(
        &self,
        session: Option<&Session>,
        file: SelectedFile,
        progress: &ProgressReporter,
    ) -> WorkflowResult<UploadOutcome> {
        let session = Self::require_session(session)?;
        Ok(self.run_upload(session, Uuid::new_v4(), file, progress).await)
    }

    /// Start an upload in the background.
    pub fn spawn_upload(
        &self,
        session: Option<&Session>,
        file: SelectedFile,
    ) -> WorkflowResult<UploadTask> {
        let session = Self::require_session(session)?.clone();
        let task_id = Uuid::new_v4();
        let session_id = session.session_id;
        let file_name = file.name.clone();
        let size = file.size();
        let (reporter, progress) = ProgressReporter::channel();

        let coordinator = self.clone();
        let handle = tokio::spawn(async move {
            coordinator
                .run_upload(&session, task_id, file, &reporter)
                .await
        });

        Ok(UploadTask {
            task_id,
            session_id,
            file_name,
            size,
            progress,
            handle,
        })
    }

    async fn run_upload(
        &self,
        session: &Session,
        task_id: Uuid,
        file: SelectedFile,
        progress: &ProgressReporter,
    ) -> UploadOutcome {
        let size = file.size();
        let SelectedFile {
            name,
            content_type,
            data,
        } = file;
        let finish = |storage_key: Option<String>, state: UploadState| UploadOutcome {
            session_id: session.session_id,
            task_id,
            file_name: name.clone(),
            size,
            storage_key,
            state,
        };

        if size > self.settings.max_upload_size_bytes {
            let error = TransferError::UploadFailed(format!(
                "File is too large ({}); the limit is {}",
                format_bytes(size),
                format_bytes(self.settings.max_upload_size_bytes)
            ));
            return finish(None, UploadState::UploadFailed(error));
        }
        let stored_size = match record_size(size) {
            Ok(stored_size) => stored_size,
            Err(e) => return finish(None, UploadState::UploadFailed(e)),
        };

        let storage_key = match user_object_key(&session.user_id, &name) {
            Ok(key) => key,
            Err(e) => return finish(None, UploadState::UploadFailed(e)),
        };

        let _key_guard = self.key_locks.lock(&storage_key).await;
        let start = Instant::now();

        if let Err(e) = self
            .storage
            .put_object(&storage_key, data, &content_type, progress)
            .await
        {
            tracing::error!(
                error = %e,
                user_id = %session.user_id,
                key = %storage_key,
                size_bytes = size,
                "Upload failed"
            );
            return finish(Some(storage_key), UploadState::UploadFailed(e));
        }

        let record = NewFileRecord {
            user_id: session.user_id.clone(),
            name: name.clone(),
            size: stored_size,
            content_type,
            storage_key: storage_key.clone(),
        };

        let state = match self.records.create_record(record).await {
            Ok(record_id) => {
                tracing::info!(
                    user_id = %session.user_id,
                    record_id = %record_id,
                    key = %storage_key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Upload saved"
                );
                UploadState::Saved { record_id }
            }
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    user_id = %session.user_id,
                    key = %storage_key,
                    "Object stored but metadata record failed"
                );
                UploadState::MetadataFailed {
                    warning: InconsistencyWarning::OrphanedObject {
                        storage_key: storage_key.clone(),
                    },
                    error,
                }
            }
        };

        finish(Some(storage_key), state)
    }

    /// Change the display name of `record`.
    ///
    /// An empty or unchanged name is a no-op. The storage key never changes.
    pub async fn rename(
        &self,
        session: Option<&Session>,
        record: &FileRecord,
        new_name: &str,
    ) -> WorkflowResult<RenameOutcome> {
        let session = Self::require_session(session)?;
        let new_name = new_name.trim();

        let outcome = |state| RenameOutcome {
            session_id: session.session_id,
            record_id: record.id,
            state,
        };

        if new_name.is_empty() || new_name == record.name {
            return Ok(outcome(RenameState::Unchanged));
        }

        let _record_guard = self.record_locks.lock(&record.id.to_string()).await;

        let state = match self.records.rename_record(record.id, new_name).await {
            Ok(()) => {
                tracing::info!(record_id = %record.id, "File renamed");
                RenameState::Renamed {
                    new_name: new_name.to_string(),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, record_id = %record.id, "Rename failed");
                RenameState::Failed(e)
            }
        };
        Ok(outcome(state))
    }

    /// Delete `record` after the user confirms: the object first, then the
    /// metadata record.
    ///
    /// An object that is already gone counts as deleted so a record left
    /// behind by an earlier partial delete can still be removed.
    pub async fn delete(
        &self,
        session: Option<&Session>,
        record: &FileRecord,
        confirmation: &dyn Confirmation,
    ) -> WorkflowResult<DeleteOutcome> {
        let session = Self::require_session(session)?;

        let outcome = |state| DeleteOutcome {
            session_id: session.session_id,
            record_id: record.id,
            file_name: record.name.clone(),
            state,
        };

        if !confirmation.confirm(&delete_prompt(&record.name)).await {
            return Ok(outcome(DeleteState::Cancelled));
        }

        let _record_guard = self.record_locks.lock(&record.id.to_string()).await;
        let _key_guard = self.key_locks.lock(&record.storage_key).await;

        match self.storage.delete_object(&record.storage_key).await {
            Ok(()) => {}
            Err(TransferError::NotFound(_)) => {
                tracing::warn!(
                    record_id = %record.id,
                    key = %record.storage_key,
                    "Object already missing; removing metadata record"
                );
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    record_id = %record.id,
                    key = %record.storage_key,
                    "Storage delete failed"
                );
                return Ok(outcome(DeleteState::StorageDeleteFailed(e)));
            }
        }

        let state = match self.records.delete_record(record.id).await {
            Ok(()) => {
                tracing::info!(record_id = %record.id, key = %record.storage_key, "File deleted");
                DeleteState::Deleted
            }
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    record_id = %record.id,
                    key = %record.storage_key,
                    "Object deleted but metadata record remains"
                );
                DeleteState::MetadataDeleteFailed {
                    warning: InconsistencyWarning::DanglingMetadata {
                        record_id: record.id,
                        storage_key: record.storage_key.clone(),
                    },
                    error,
                }
            }
        };
        Ok(outcome(state))
    }

    /// The session user's files, newest first, each with a freshly signed
    /// download URL.
    ///
    /// A URL that cannot be signed leaves that row without one.
    pub async fn list(&self, session: Option<&Session>) -> WorkflowResult<Vec<FileListing>> {
        let session = Self::require_session(session)?;
        let records = self.records.list_records(&session.user_id).await?;

        let mut listings = Vec::with_capacity(records.len());
        for record in records {
            let url = match self
                .storage
                .signed_url(&record.storage_key, self.settings.signed_url_expiry)
                .await
            {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        record_id = %record.id,
                        key = %record.storage_key,
                        "Failed to sign download URL"
                    );
                    None
                }
            };
            listings.push(FileListing::new(record, url));
        }

        tracing::debug!(
            user_id = %session.user_id,
            count = listings.len(),
            "Listed files"
        );
        Ok(listings)
    }
}

/// Byte count as stored on a metadata record.
fn record_size(size: u64) -> Result<i64, TransferError> {
    i64::try_from(size).map_err(|_| {
        TransferError::UploadFailed(format!("File size {} bytes cannot be recorded", size))
    })
}
