//! Workflow states and the outcomes the coordinator hands back.
//!
//! Every outcome is stamped with the `session_id` it was started under so a
//! completion arriving after a sign-out can be discarded.

use crate::error::InconsistencyWarning;
use filedock_core::ErrorMetadata;
use filedock_db::StoreError;
use filedock_storage::TransferError;
use uuid::Uuid;

/// Terminal state of an upload. While it runs, progress travels on the
/// task's watch channel instead.
#[derive(Debug)]
pub enum UploadState {
    /// Object stored and metadata recorded.
    Saved { record_id: Uuid },
    /// The object was not stored; nothing else was attempted.
    UploadFailed(TransferError),
    /// The object was stored but its metadata record was not.
    MetadataFailed {
        warning: InconsistencyWarning,
        error: StoreError,
    },
}

impl UploadState {
    /// Text shown on a row in this state, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            UploadState::UploadFailed(e) => Some(e.client_message()),
            UploadState::MetadataFailed { warning, .. } => Some(warning.client_message()),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub session_id: Uuid,
    /// Temporary id of the interim row this upload was shown under.
    pub task_id: Uuid,
    pub file_name: String,
    pub size: u64,
    /// Absent when the upload was rejected before a key could be built.
    pub storage_key: Option<String>,
    pub state: UploadState,
}

impl UploadOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self.state, UploadState::Saved { .. })
    }

    pub fn record_id(&self) -> Option<Uuid> {
        match self.state {
            UploadState::Saved { record_id } => Some(record_id),
            _ => None,
        }
    }
}

/// Terminal state of a delete: `Deleted | StorageDeleteFailed |
/// MetadataDeleteFailed`, or `Cancelled` when the user declines.
#[derive(Debug)]
pub enum DeleteState {
    Cancelled,
    Deleted,
    /// The object delete failed; the metadata record was left untouched.
    StorageDeleteFailed(TransferError),
    /// The object is gone but the metadata record could not be removed.
    MetadataDeleteFailed {
        warning: InconsistencyWarning,
        error: StoreError,
    },
}

impl DeleteState {
    pub fn message(&self) -> Option<String> {
        match self {
            DeleteState::StorageDeleteFailed(e) => Some(e.client_message()),
            DeleteState::MetadataDeleteFailed { warning, .. } => Some(warning.client_message()),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct DeleteOutcome {
    pub session_id: Uuid,
    pub record_id: Uuid,
    pub file_name: String,
    pub state: DeleteState,
}

#[derive(Debug)]
pub enum RenameState {
    /// Empty or unchanged name; nothing was sent to the store.
    Unchanged,
    Renamed { new_name: String },
    Failed(StoreError),
}

#[derive(Debug)]
pub struct RenameOutcome {
    pub session_id: Uuid,
    pub record_id: Uuid,
    pub state: RenameState,
}

impl RenameOutcome {
    pub fn is_renamed(&self) -> bool {
        matches!(self.state, RenameState::Renamed { .. })
    }
}
