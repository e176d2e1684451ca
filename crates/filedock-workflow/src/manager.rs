//! Glue between the identity gateway, the coordinator and the list view.

use crate::confirm::Confirmation;
use crate::coordinator::FileCoordinator;
use crate::error::{WorkflowError, WorkflowResult};
use crate::state::{DeleteOutcome, RenameOutcome, UploadOutcome};
use crate::view::FileListView;
use async_trait::async_trait;
use filedock_core::{FileRecord, SelectedFile, Session};
use filedock_identity::{AuthError, IdentityGateway, SessionSubscription};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Drives a [`FileListView`] from session changes and workflow outcomes.
///
/// Every operation runs under the session current when it starts. Its
/// outcome is applied to the view only if that session is still current
/// when it completes.
pub struct FileManager {
    gateway: IdentityGateway,
    coordinator: FileCoordinator,
    view: Arc<Mutex<FileListView>>,
    subscription: Option<SessionSubscription>,
}

impl FileManager {
    pub fn new(gateway: IdentityGateway, coordinator: FileCoordinator) -> Self {
        Self {
            gateway,
            coordinator,
            view: Arc::new(Mutex::new(FileListView::new())),
            subscription: None,
        }
    }

    pub fn gateway(&self) -> &IdentityGateway {
        &self.gateway
    }

    pub fn coordinator(&self) -> &FileCoordinator {
        &self.coordinator
    }

    /// Follow session changes: reset the view on every change and load the
    /// new user's files. Calling it again replaces the previous registration.
    pub fn start(&mut self) {
        let coordinator = self.coordinator.clone();
        let view = Arc::clone(&self.view);

        let subscription = self.gateway.on_session_change(move |session| {
            let coordinator = coordinator.clone();
            let view = Arc::clone(&view);
            async move {
                view.lock().await.session_changed(session.as_ref());
                if let Some(session) = session {
                    load(&coordinator, &view, &session).await;
                }
            }
        });
        self.subscription = Some(subscription);
    }

    /// Stop following session changes.
    pub fn stop(&mut self) {
        self.subscription = None;
    }

    /// A copy of the current view state.
    pub async fn snapshot(&self) -> FileListView {
        self.view.lock().await.clone()
    }

    pub async fn dismiss_banner(&self) {
        self.view.lock().await.dismiss_banner();
    }

    /// Reload the file list for the current session.
    pub async fn refresh(&self) {
        if let Some(session) = self.gateway.current_session() {
            load(&self.coordinator, &self.view, &session).await;
        }
    }

    /// Upload `file`, showing an interim row with live progress until the
    /// outcome is known.
    pub async fn upload(&self, file: SelectedFile) -> WorkflowResult<UploadOutcome> {
        let Some(session) = self.gateway.current_session() else {
            return Err(self.fail(WorkflowError::Auth(AuthError::NotSignedIn)).await);
        };
        let task = match self.coordinator.spawn_upload(Some(&session), file) {
            Ok(task) => task,
            Err(e) => return Err(self.fail(e).await),
        };

        self.view.lock().await.begin_upload(&task);

        let task_id = task.task_id;
        let mut progress = task.progress();
        let view = Arc::clone(&self.view);
        tokio::spawn(async move {
            while progress.changed().await.is_ok() {
                let percent = *progress.borrow_and_update();
                view.lock().await.update_progress(task_id, percent);
            }
        });

        let outcome = task.wait().await?;
        if self.still_current(&session) {
            self.view.lock().await.apply_upload(&outcome);
            if outcome.is_saved() {
                self.refresh().await;
            }
        }
        Ok(outcome)
    }

    pub async fn rename(&self, record: &FileRecord, new_name: &str) -> WorkflowResult<RenameOutcome> {
        let session = self.gateway.current_session();
        let outcome = match self
            .coordinator
            .rename(session.as_ref(), record, new_name)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(e).await),
        };

        if session.as_ref().is_some_and(|s| self.still_current(s)) {
            self.view.lock().await.apply_rename(&outcome);
            if outcome.is_renamed() {
                self.refresh().await;
            }
        }
        Ok(outcome)
    }

    /// Delete `record`. Its row shows as deleting from the moment the user
    /// confirms until the outcome is known.
    pub async fn delete(
        &self,
        record: &FileRecord,
        confirmation: &dyn Confirmation,
    ) -> WorkflowResult<DeleteOutcome> {
        let session = self.gateway.current_session();
        let marking = MarkDeleting {
            inner: confirmation,
            view: &self.view,
            session_id: session.as_ref().map(|s| s.session_id),
            record_id: record.id,
        };
        let outcome = match self
            .coordinator
            .delete(session.as_ref(), record, &marking)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(e).await),
        };

        if session.as_ref().is_some_and(|s| self.still_current(s)) {
            self.view.lock().await.apply_delete(&outcome);
        }
        Ok(outcome)
    }

    fn still_current(&self, session: &Session) -> bool {
        let current = self.gateway.is_current(session);
        if !current {
            tracing::debug!(
                session_id = %session.session_id,
                "Session changed while an operation was running; discarding result"
            );
        }
        current
    }

    async fn fail(&self, error: WorkflowError) -> WorkflowError {
        self.view.lock().await.show_error(&error);
        error
    }
}

/// Passes the user's answer through and marks the row once it is a yes.
struct MarkDeleting<'a> {
    inner: &'a dyn Confirmation,
    view: &'a Mutex<FileListView>,
    session_id: Option<Uuid>,
    record_id: Uuid,
}

#[async_trait]
impl Confirmation for MarkDeleting<'_> {
    async fn confirm(&self, prompt: &str) -> bool {
        let confirmed = self.inner.confirm(prompt).await;
        if let (true, Some(session_id)) = (confirmed, self.session_id) {
            self.view.lock().await.begin_delete(session_id, self.record_id);
        }
        confirmed
    }
}

async fn load(coordinator: &FileCoordinator, view: &Mutex<FileListView>, session: &Session) {
    if !view.lock().await.begin_loading(session.session_id) {
        return;
    }
    let listing = coordinator.list(Some(session)).await;
    view.lock().await.apply_listing(session.session_id, listing);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AutoConfirm;
    use crate::view::{ListState, RowStatus, EMPTY_TEXT, SIGNED_OUT_TEXT};
    use filedock_db::MemoryFileRecordStore;
    use filedock_identity::MemoryIdentityProvider;
    use filedock_storage::MemoryStorage;
    use std::time::Duration;

    fn manager() -> (FileManager, MemoryStorage, MemoryFileRecordStore) {
        let storage = MemoryStorage::ephemeral();
        let records = MemoryFileRecordStore::new();
        let coordinator =
            FileCoordinator::new(Arc::new(storage.clone()), Arc::new(records.clone()));
        let gateway = IdentityGateway::new(Arc::new(MemoryIdentityProvider::new()));
        (FileManager::new(gateway, coordinator), storage, records)
    }

    async fn wait_for<F>(manager: &FileManager, predicate: F) -> FileListView
    where
        F: Fn(&FileListView) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let view = manager.snapshot().await;
            if predicate(&view) {
                return view;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "view never reached the expected state: {:?}",
                view
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_upload_without_session_shows_banner() {
        let (mut manager, storage, _) = manager();
        manager.start();

        let err = manager
            .upload(SelectedFile::new("a.txt", None, b"x".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Auth(_)));

        let view = manager.snapshot().await;
        assert_eq!(
            view.banner().unwrap().message,
            "You must be logged in to upload files."
        );
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_session_lifecycle_drives_view() {
        let (mut manager, _, _) = manager();
        manager.start();
        wait_for(&manager, |v| v.empty_message() == Some(SIGNED_OUT_TEXT)).await;

        manager.gateway().sign_up("a@example.com", "secret1").await;
        wait_for(&manager, |v| v.empty_message() == Some(EMPTY_TEXT)).await;

        let outcome = manager
            .upload(SelectedFile::new("a.txt", Some("text/plain"), b"hello".to_vec()))
            .await
            .unwrap();
        assert!(outcome.is_saved());

        let view = manager.snapshot().await;
        assert_eq!(view.state(), ListState::Ready);
        assert_eq!(view.rows().len(), 1);
        assert_eq!(view.rows()[0].status, RowStatus::Ready);
        assert!(view.rows()[0].download_url.is_some());

        manager.gateway().logout().await;
        let view = wait_for(&manager, |v| v.state() == ListState::SignedOut).await;
        assert!(view.rows().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let (mut manager, storage, records) = manager();
        manager.start();
        manager.gateway().sign_up("a@example.com", "secret1").await;
        wait_for(&manager, |v| v.state() == ListState::Ready).await;

        manager
            .upload(SelectedFile::new("a.txt", None, b"x".to_vec()))
            .await
            .unwrap();
        let record = manager.snapshot().await.rows()[0].record.clone().unwrap();

        let outcome = manager.delete(&record, &AutoConfirm(true)).await.unwrap();
        assert!(outcome.state.message().is_none());
        assert!(manager.snapshot().await.rows().is_empty());
        assert!(storage.is_empty());
        assert!(records.is_empty());
    }
}
