//! Workflow errors and partial-failure warnings.

use filedock_core::{ErrorMetadata, LogLevel};
use filedock_db::StoreError;
use filedock_identity::AuthError;
use filedock_storage::TransferError;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the coordinator.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl ErrorMetadata for WorkflowError {
    fn error_code(&self) -> &'static str {
        match self {
            WorkflowError::Auth(e) => e.error_code(),
            WorkflowError::Store(e) => e.error_code(),
            WorkflowError::Transfer(e) => e.error_code(),
            WorkflowError::Task(_) => "TASK_FAILED",
        }
    }

    fn client_message(&self) -> String {
        match self {
            WorkflowError::Auth(e) => e.client_message(),
            WorkflowError::Store(e) => e.client_message(),
            WorkflowError::Transfer(e) => e.client_message(),
            WorkflowError::Task(_) => "The operation was interrupted".to_string(),
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            WorkflowError::Auth(e) => e.suggested_action(),
            WorkflowError::Store(e) => e.suggested_action(),
            WorkflowError::Transfer(e) => e.suggested_action(),
            WorkflowError::Task(_) => Some("Try again"),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            WorkflowError::Auth(e) => e.log_level(),
            WorkflowError::Store(e) => e.log_level(),
            WorkflowError::Transfer(e) => e.log_level(),
            WorkflowError::Task(_) => LogLevel::Error,
        }
    }
}

/// The two stores disagree after a partially failed workflow.
///
/// Nothing is rolled back; the warning tells the user what is left behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InconsistencyWarning {
    /// The object was stored but no metadata record points at it.
    #[error("Saved to cloud storage but saving file details failed")]
    OrphanedObject { storage_key: String },

    /// The object is gone but its metadata record remains.
    #[error("Deleted from storage but metadata still present")]
    DanglingMetadata { record_id: Uuid, storage_key: String },
}

impl InconsistencyWarning {
    pub fn storage_key(&self) -> &str {
        match self {
            InconsistencyWarning::OrphanedObject { storage_key }
            | InconsistencyWarning::DanglingMetadata { storage_key, .. } => storage_key,
        }
    }
}

impl ErrorMetadata for InconsistencyWarning {
    fn error_code(&self) -> &'static str {
        match self {
            InconsistencyWarning::OrphanedObject { .. } => "ORPHANED_OBJECT",
            InconsistencyWarning::DanglingMetadata { .. } => "DANGLING_METADATA",
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            InconsistencyWarning::OrphanedObject { .. } => {
                Some("Upload the file again to save its details")
            }
            InconsistencyWarning::DanglingMetadata { .. } => {
                Some("Delete the file again to remove the leftover entry")
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Warn
    }
}
