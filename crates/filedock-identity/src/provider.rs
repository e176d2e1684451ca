use crate::error::AuthError;
use async_trait::async_trait;
use filedock_core::{FederatedProvider, Session};

/// External identity service.
///
/// Every successful call issues a fresh [`Session`] with its own
/// `session_id`, even for a user who was already signed in.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an email/password account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Interactive federated sign-in (a popup in browser clients).
    async fn sign_in_with_provider(&self, provider: FederatedProvider)
        -> Result<Session, AuthError>;

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError>;
}
