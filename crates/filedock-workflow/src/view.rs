//! Headless view model of the file list.
//!
//! [`FileListView`] turns workflow outcomes into rows, an empty-state text and
//! a banner. It makes no decisions of its own: every change comes from an
//! outcome, and outcomes stamped with another session are ignored.

use crate::coordinator::UploadTask;
use crate::error::WorkflowError;
use crate::state::{DeleteOutcome, DeleteState, RenameOutcome, RenameState, UploadOutcome, UploadState};
use filedock_core::{format_bytes, format_upload_date, ErrorMetadata, FileListing, FileRecord, Session};
use uuid::Uuid;

pub const SIGNED_OUT_TEXT: &str = "Please login to view files.";
pub const LOADING_TEXT: &str = "Loading your files...";
pub const EMPTY_TEXT: &str = "No files uploaded yet. Start now!";
pub const LOAD_FAILED_TEXT: &str = "Failed to load history.";
pub const UPLOADING_DATE_TEXT: &str = "Uploading...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    SignedOut,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowId {
    /// A persisted record.
    Record(Uuid),
    /// An upload that has no record yet, keyed by its task id.
    Pending(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    Uploading { progress: u8 },
    /// Delete confirmed and in flight.
    Deleting,
    Ready,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub id: RowId,
    pub name: String,
    pub size_label: String,
    pub date_label: String,
    pub status: RowStatus,
    pub download_url: Option<String>,
    /// The record behind the row; `None` for pending uploads.
    pub record: Option<FileRecord>,
}

impl FileRow {
    fn from_listing(listing: FileListing) -> Self {
        let FileListing {
            record,
            download_url,
        } = listing;
        Self {
            id: RowId::Record(record.id),
            name: record.name.clone(),
            size_label: format_bytes(record.size_bytes()),
            date_label: format_upload_date(record.created_at),
            status: RowStatus::Ready,
            download_url,
            record: Some(record),
        }
    }

    fn pending(task_id: Uuid, name: &str, size: u64) -> Self {
        Self {
            id: RowId::Pending(task_id),
            name: name.to_string(),
            size_label: format_bytes(size),
            date_label: UPLOADING_DATE_TEXT.to_string(),
            status: RowStatus::Uploading { progress: 0 },
            download_url: None,
            record: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.id, RowId::Pending(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub level: BannerLevel,
    pub message: String,
}

impl Banner {
    fn new(level: BannerLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileListView {
    session_id: Option<Uuid>,
    state: ListState,
    rows: Vec<FileRow>,
    banner: Option<Banner>,
}

impl Default for FileListView {
    fn default() -> Self {
        Self::new()
    }
}

impl FileListView {
    pub fn new() -> Self {
        Self {
            session_id: None,
            state: ListState::SignedOut,
            rows: Vec::new(),
            banner: None,
        }
    }

    pub fn state(&self) -> ListState {
        self.state
    }

    pub fn rows(&self) -> &[FileRow] {
        &self.rows
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn row(&self, id: RowId) -> Option<&FileRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    /// Placeholder text shown instead of rows, if any.
    pub fn empty_message(&self) -> Option<&'static str> {
        match self.state {
            ListState::SignedOut => Some(SIGNED_OUT_TEXT),
            ListState::Failed => Some(LOAD_FAILED_TEXT),
            ListState::Loading if self.rows.is_empty() => Some(LOADING_TEXT),
            ListState::Ready if self.rows.is_empty() => Some(EMPTY_TEXT),
            _ => None,
        }
    }

    fn is_current(&self, session_id: Uuid) -> bool {
        self.session_id == Some(session_id)
    }

    /// Reset for a new session (or for none). Everything from the previous
    /// session is dropped.
    pub fn session_changed(&mut self, session: Option<&Session>) {
        self.rows.clear();
        self.banner = None;
        match session {
            Some(session) => {
                self.session_id = Some(session.session_id);
                self.state = ListState::Loading;
            }
            None => {
                self.session_id = None;
                self.state = ListState::SignedOut;
            }
        }
    }

    /// Mark a refresh in progress. Pending uploads stay visible.
    pub fn begin_loading(&mut self, session_id: Uuid) -> bool {
        if !self.is_current(session_id) {
            return false;
        }
        self.rows.retain(FileRow::is_pending);
        self.state = ListState::Loading;
        true
    }

    /// Replace the record rows with a fresh listing.
    pub fn apply_listing(
        &mut self,
        session_id: Uuid,
        listing: Result<Vec<FileListing>, WorkflowError>,
    ) -> bool {
        if !self.is_current(session_id) {
            tracing::debug!(session_id = %session_id, "Discarding listing from a stale session");
            return false;
        }

        self.rows.retain(FileRow::is_pending);
        match listing {
            Ok(listings) => {
                self.rows
                    .extend(listings.into_iter().map(FileRow::from_listing));
                self.state = ListState::Ready;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load file list");
                self.state = ListState::Failed;
            }
        }
        true
    }

    /// Show the interim row of a started upload at the top of the list.
    pub fn begin_upload(&mut self, task: &UploadTask) -> bool {
        if !self.is_current(task.session_id) {
            return false;
        }
        self.rows
            .insert(0, FileRow::pending(task.task_id, &task.file_name, task.size));
        true
    }

    pub fn update_progress(&mut self, task_id: Uuid, progress: u8) {
        if let Some(row) = self.rows.iter_mut().find(|r| r.id == RowId::Pending(task_id)) {
            if let RowStatus::Uploading { progress: current } = &mut row.status {
                *current = progress.min(100).max(*current);
            }
        }
    }

    /// Resolve the interim row of a finished upload.
    ///
    /// A saved upload's row is dropped; the refreshed listing brings the
    /// record. A failed upload's row stays with the failure message.
    pub fn apply_upload(&mut self, outcome: &UploadOutcome) -> bool {
        if !self.is_current(outcome.session_id) {
            tracing::debug!(task_id = %outcome.task_id, "Discarding upload outcome from a stale session");
            return false;
        }

        let id = RowId::Pending(outcome.task_id);
        match &outcome.state {
            UploadState::Saved { .. } => {
                self.rows.retain(|row| row.id != id);
            }
            UploadState::UploadFailed(_) | UploadState::MetadataFailed { .. } => {
                let message = outcome.state.message().unwrap_or_default();
                if let UploadState::MetadataFailed { warning, .. } = &outcome.state {
                    self.banner = Some(Banner::new(
                        BannerLevel::Warning,
                        format!("{}: {}", outcome.file_name, warning.client_message()),
                    ));
                }
                let status = RowStatus::Failed {
                    message: format!("Error: {}", message),
                };
                match self.rows.iter_mut().find(|row| row.id == id) {
                    Some(row) => row.status = status,
                    None => {
                        let mut row = FileRow::pending(outcome.task_id, &outcome.file_name, outcome.size);
                        row.status = status;
                        self.rows.insert(0, row);
                    }
                }
            }
        }
        true
    }

    pub fn apply_rename(&mut self, outcome: &RenameOutcome) -> bool {
        if !self.is_current(outcome.session_id) {
            return false;
        }

        match &outcome.state {
            RenameState::Unchanged => {}
            RenameState::Renamed { new_name } => {
                if let Some(row) = self
                    .rows
                    .iter_mut()
                    .find(|row| row.id == RowId::Record(outcome.record_id))
                {
                    row.name = new_name.clone();
                    if let Some(record) = row.record.as_mut() {
                        record.name = new_name.clone();
                    }
                }
            }
            RenameState::Failed(e) => {
                self.banner = Some(Banner::new(
                    BannerLevel::Error,
                    format!("Failed to rename file: {}", e.client_message()),
                ));
            }
        }
        true
    }

    /// Mark a record row as being deleted.
    pub fn begin_delete(&mut self, session_id: Uuid, record_id: Uuid) -> bool {
        if !self.is_current(session_id) {
            return false;
        }
        match self.rows.iter_mut().find(|row| row.id == RowId::Record(record_id)) {
            Some(row) => {
                row.status = RowStatus::Deleting;
                true
            }
            None => false,
        }
    }

    /// Remove a deleted row, or put a row whose delete did not go through
    /// back to ready.
    pub fn apply_delete(&mut self, outcome: &DeleteOutcome) -> bool {
        if !self.is_current(outcome.session_id) {
            return false;
        }

        if let Some(row) = self
            .rows
            .iter_mut()
            .find(|row| row.id == RowId::Record(outcome.record_id))
        {
            if row.status == RowStatus::Deleting {
                row.status = RowStatus::Ready;
            }
        }

        match &outcome.state {
            DeleteState::Deleted => {
                self.rows
                    .retain(|row| row.id != RowId::Record(outcome.record_id));
            }
            DeleteState::StorageDeleteFailed(_) => {
                self.banner = Some(Banner::new(
                    BannerLevel::Error,
                    outcome.state.message().unwrap_or_default(),
                ));
            }
            DeleteState::MetadataDeleteFailed { warning, .. } => {
                self.banner = Some(Banner::new(
                    BannerLevel::Warning,
                    format!("{}: {}", outcome.file_name, warning.client_message()),
                ));
            }
            DeleteState::Cancelled => {}
        }
        true
    }

    /// Show a failure that has no row of its own (e.g. not signed in).
    pub fn show_error(&mut self, error: &WorkflowError) {
        self.banner = Some(Banner::new(BannerLevel::Error, error.client_message()));
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }
}
