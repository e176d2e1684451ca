//! Identity gateway: sign-in operations and session-change notifications.
//!
//! The current session is held in a `tokio::sync::watch` channel. Observers see
//! the latest state; intermediate states produced faster than an observer
//! handles them are coalesced.

use crate::error::AuthError;
use crate::provider::IdentityProvider;
use filedock_core::{ErrorMetadata, FederatedProvider, Session};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Result of an authentication operation.
///
/// Exactly one of `session` and `error` is set for sign-in operations. A
/// sign-out carries no session and an error only if the provider failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub session: Option<Session>,
    pub error: Option<String>,
}

impl AuthOutcome {
    fn signed_in(session: Session) -> Self {
        Self {
            session: Some(session),
            error: None,
        }
    }

    fn failed(error: &AuthError) -> Self {
        Self {
            session: None,
            error: Some(error.client_message()),
        }
    }

    fn signed_out() -> Self {
        Self {
            session: None,
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Polling handle on the current session.
#[derive(Debug, Clone)]
pub struct SessionWatcher {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionWatcher {
    pub fn current(&self) -> Option<Session> {
        self.rx.borrow().clone()
    }

    /// Wait for the next sign-in or sign-out and return the new state.
    ///
    /// Returns `None` once the gateway is gone.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// A registered session-change handler. Dropping it stops notifications.
#[derive(Debug)]
pub struct SessionSubscription {
    handle: JoinHandle<()>,
}

impl SessionSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Front door for authentication.
///
/// Clones share the same provider and session state.
#[derive(Clone)]
pub struct IdentityGateway {
    provider: Arc<dyn IdentityProvider>,
    session_tx: Arc<watch::Sender<Option<Session>>>,
}

impl IdentityGateway {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (session_tx, _) = watch::channel(None);
        Self {
            provider,
            session_tx: Arc::new(session_tx),
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthOutcome {
        let result = self.provider.sign_up(email, password).await;
        self.complete_sign_in("sign_up", result)
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let result = self.provider.sign_in(email, password).await;
        self.complete_sign_in("login", result)
    }

    pub async fn login_with_provider(&self, provider: FederatedProvider) -> AuthOutcome {
        let result = self.provider.sign_in_with_provider(provider).await;
        self.complete_sign_in("login_with_provider", result)
    }

    /// Sign out the current session, if any.
    ///
    /// When the provider fails the session stays active and the error is
    /// returned in the outcome.
    pub async fn logout(&self) -> AuthOutcome {
        let Some(session) = self.current_session() else {
            return AuthOutcome::signed_out();
        };

        if let Err(e) = self.provider.sign_out(&session).await {
            tracing::warn!(
                error = %e,
                user_id = %session.user_id,
                "Sign out failed"
            );
            return AuthOutcome::failed(&e);
        }

        self.session_tx.send_if_modified(|current| {
            if current.as_ref().map(|s| s.session_id) == Some(session.session_id) {
                *current = None;
                true
            } else {
                false
            }
        });
        tracing::info!(user_id = %session.user_id, "Signed out");
        AuthOutcome::signed_out()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session_tx.borrow().clone()
    }

    /// Whether `session` is still the active session.
    ///
    /// Completions started under an older session use this to discard their
    /// results.
    pub fn is_current(&self, session: &Session) -> bool {
        self.session_tx
            .borrow()
            .as_ref()
            .is_some_and(|current| current.session_id == session.session_id)
    }

    pub fn subscribe(&self) -> SessionWatcher {
        SessionWatcher {
            rx: self.session_tx.subscribe(),
        }
    }

    /// Register `handler` for session changes.
    ///
    /// The handler runs once right away with the current state, then after
    /// every sign-in and sign-out. Invocations never overlap.
    pub fn on_session_change<F, Fut>(&self, handler: F) -> SessionSubscription
    where
        F: Fn(Option<Session>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut rx = self.session_tx.subscribe();
        let handle = tokio::spawn(async move {
            let initial = rx.borrow_and_update().clone();
            handler(initial).await;
            while rx.changed().await.is_ok() {
                let session = rx.borrow_and_update().clone();
                handler(session).await;
            }
        });
        SessionSubscription { handle }
    }

    fn complete_sign_in(
        &self,
        operation: &'static str,
        result: Result<Session, AuthError>,
    ) -> AuthOutcome {
        match result {
            Ok(session) => {
                tracing::info!(
                    operation,
                    user_id = %session.user_id,
                    session_id = %session.session_id,
                    "Signed in"
                );
                self.session_tx.send_replace(Some(session.clone()));
                AuthOutcome::signed_in(session)
            }
            Err(e) => {
                tracing::debug!(operation, error = %e, "Authentication failed");
                AuthOutcome::failed(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryIdentityProvider;
    use tokio::sync::mpsc;

    fn gateway() -> (IdentityGateway, MemoryIdentityProvider) {
        let provider = MemoryIdentityProvider::new();
        (IdentityGateway::new(Arc::new(provider.clone())), provider)
    }

    #[tokio::test]
    async fn test_login_failure_returns_message_not_error() {
        let (gateway, _) = gateway();
        let outcome = gateway.login("nobody@example.com", "secret1").await;
        assert!(outcome.session.is_none());
        assert_eq!(
            outcome.error.as_deref(),
            Some("No account found for this email")
        );
        assert!(gateway.current_session().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_signs_in() {
        let (gateway, _) = gateway();
        let outcome = gateway.sign_up("a@example.com", "secret1").await;
        let session = outcome.session.unwrap();
        assert!(outcome.error.is_none());
        assert!(gateway.is_current(&session));
    }

    #[tokio::test]
    async fn test_relogin_makes_previous_session_stale() {
        let (gateway, _) = gateway();
        let first = gateway
            .sign_up("a@example.com", "secret1")
            .await
            .session
            .unwrap();
        let second = gateway
            .login("a@example.com", "secret1")
            .await
            .session
            .unwrap();

        assert!(!gateway.is_current(&first));
        assert!(gateway.is_current(&second));
    }

    #[tokio::test]
    async fn test_logout_failure_keeps_session() {
        let (gateway, provider) = gateway();
        let session = gateway
            .sign_up("a@example.com", "secret1")
            .await
            .session
            .unwrap();

        provider.fail_next_sign_out("network down");
        let outcome = gateway.logout().await;
        assert!(outcome.session.is_none());
        assert!(outcome.error.unwrap().contains("network down"));
        assert!(gateway.is_current(&session));

        let outcome = gateway.logout().await;
        assert!(outcome.is_ok());
        assert!(!gateway.is_current(&session));
    }

    #[tokio::test]
    async fn test_on_session_change_fires_immediately_then_on_changes() {
        let (gateway, provider) = gateway();
        provider.link_provider(FederatedProvider::Github, Some("gh@example.com"), true);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = gateway.on_session_change(move |session| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(session.map(|s| s.user_id));
            }
        });

        assert_eq!(rx.recv().await.unwrap(), None);

        let session = gateway
            .login_with_provider(FederatedProvider::Github)
            .await
            .session
            .unwrap();
        assert_eq!(rx.recv().await.unwrap(), Some(session.user_id));

        gateway.logout().await;
        assert_eq!(rx.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_watcher_sees_changes() {
        let (gateway, _) = gateway();
        let mut watcher = gateway.subscribe();
        assert!(watcher.current().is_none());

        let session = gateway
            .sign_up("a@example.com", "secret1")
            .await
            .session
            .unwrap();
        assert_eq!(watcher.changed().await, Some(Some(session)));
    }
}
