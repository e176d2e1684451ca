//! Filedock workflow layer
//!
//! Coordinates the two-phase upload (object, then metadata record) and delete
//! (object, then metadata record) workflows over the storage, metadata and
//! identity adapters, and exposes a headless view model of the file list.
//!
//! # Example
//!
//! ```ignore
//! use filedock_workflow::{FileCoordinator, FileManager};
//!
//! let coordinator = FileCoordinator::new(storage, records);
//! let mut manager = FileManager::new(gateway, coordinator);
//! manager.start();
//! ```

pub mod confirm;
pub mod coordinator;
pub mod error;
pub mod locks;
pub mod manager;
pub mod state;
pub mod telemetry;
pub mod view;

pub use confirm::{delete_prompt, AutoConfirm, Confirmation};
pub use coordinator::{CoordinatorSettings, FileCoordinator, UploadTask};
pub use error::{InconsistencyWarning, WorkflowError, WorkflowResult};
pub use locks::{KeyGuard, KeyedLocks};
pub use manager::FileManager;
pub use state::{
    DeleteOutcome, DeleteState, RenameOutcome, RenameState, UploadOutcome, UploadState,
};
pub use view::{Banner, BannerLevel, FileListView, FileRow, ListState, RowId, RowStatus};
