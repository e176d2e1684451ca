//! In-process identity provider for tests and local development.

use crate::credentials::Credentials;
use crate::error::AuthError;
use crate::provider::IdentityProvider;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use dashmap::DashMap;
use filedock_core::{FederatedProvider, Session, SignInMethod};
use rand_core::OsRng;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    email: String,
    password_hash: String,
}

#[derive(Debug, Clone)]
struct FederatedIdentity {
    user_id: String,
    email: Option<String>,
    email_verified: bool,
}

/// Identity provider keeping accounts in memory.
///
/// Passwords are stored as Argon2 hashes. Federated identities must be linked
/// with [`MemoryIdentityProvider::link_provider`] before they can sign in; an
/// unlinked provider fails the same way a dismissed popup does.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityProvider {
    accounts: Arc<DashMap<String, Account>>,
    federated: Arc<DashMap<FederatedProvider, FederatedIdentity>>,
    sign_out_failure: Arc<Mutex<Option<String>>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `provider` sign in as a new user; returns that user's id.
    pub fn link_provider(
        &self,
        provider: FederatedProvider,
        email: Option<&str>,
        email_verified: bool,
    ) -> String {
        let user_id = Uuid::new_v4().simple().to_string();
        self.federated.insert(
            provider,
            FederatedIdentity {
                user_id: user_id.clone(),
                email: email.map(str::to_string),
                email_verified,
            },
        );
        user_id
    }

    /// Make the next sign-out fail with `message`.
    pub fn fail_next_sign_out(&self, message: &str) {
        let mut failure = self
            .sign_out_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *failure = Some(message.to_string());
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Provider(format!("Failed to hash password: {}", e)))
    })
    .await
    .map_err(|e| AuthError::Provider(format!("Password hashing task failed: {}", e)))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&hash)
            .map_err(|e| AuthError::Provider(format!("Invalid hash format: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await
    .map_err(|e| AuthError::Provider(format!("Password verification task failed: {}", e)))?
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let credentials = Credentials::new(email, password);
        credentials.check()?;
        let key = credentials.normalized_email();

        if self.accounts.contains_key(&key) {
            return Err(AuthError::EmailInUse);
        }

        let password_hash = hash_password(credentials.password.clone()).await?;
        let account = Account {
            user_id: Uuid::new_v4().simple().to_string(),
            email: credentials.email.clone(),
            password_hash,
        };

        // Another sign-up for the same email may have finished while hashing.
        let account = match self.accounts.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => return Err(AuthError::EmailInUse),
            dashmap::mapref::entry::Entry::Vacant(entry) => entry.insert(account).value().clone(),
        };

        tracing::info!(user_id = %account.user_id, "Account created");
        Ok(Session::new(
            account.user_id,
            Some(account.email),
            SignInMethod::Password,
        ))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let credentials = Credentials::new(email, password);
        let account = self
            .accounts
            .get(&credentials.normalized_email())
            .map(|entry| entry.value().clone())
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(credentials.password, account.password_hash).await? {
            return Err(AuthError::WrongPassword);
        }

        Ok(Session::new(
            account.user_id,
            Some(account.email),
            SignInMethod::Password,
        ))
    }

    async fn sign_in_with_provider(
        &self,
        provider: FederatedProvider,
    ) -> Result<Session, AuthError> {
        let identity = self
            .federated
            .get(&provider)
            .map(|entry| entry.value().clone())
            .ok_or(AuthError::ProviderUnavailable(provider))?;

        Ok(Session::new(
            identity.user_id,
            identity.email,
            SignInMethod::Federated(provider),
        )
        .with_email_verified(identity.email_verified))
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), AuthError> {
        let failure = self
            .sign_out_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match failure {
            Some(message) => Err(AuthError::Provider(message)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let provider = MemoryIdentityProvider::new();
        let signed_up = provider.sign_up("Ada@Example.com", "secret1").await.unwrap();
        let signed_in = provider.sign_in("ada@example.com", "secret1").await.unwrap();

        assert_eq!(signed_up.user_id, signed_in.user_id);
        assert_ne!(signed_up.session_id, signed_in.session_id);
        assert_eq!(signed_in.method, SignInMethod::Password);
        assert_eq!(provider.account_count(), 1);
    }

    #[tokio::test]
    async fn test_password_is_not_stored_in_clear() {
        let provider = MemoryIdentityProvider::new();
        provider.sign_up("a@example.com", "secret1").await.unwrap();
        let account = provider.accounts.get("a@example.com").unwrap();
        assert!(account.password_hash.starts_with("$argon2"));
        assert!(!account.password_hash.contains("secret1"));
    }

    #[tokio::test]
    async fn test_sign_in_failures() {
        let provider = MemoryIdentityProvider::new();
        provider.sign_up("a@example.com", "secret1").await.unwrap();

        assert!(matches!(
            provider.sign_in("a@example.com", "wrong-pass").await,
            Err(AuthError::WrongPassword)
        ));
        assert!(matches!(
            provider.sign_in("b@example.com", "secret1").await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            provider.sign_up("A@example.com", "another").await,
            Err(AuthError::EmailInUse)
        ));
    }

    #[tokio::test]
    async fn test_federated_sign_in_requires_link() {
        let provider = MemoryIdentityProvider::new();
        assert!(matches!(
            provider
                .sign_in_with_provider(FederatedProvider::Google)
                .await,
            Err(AuthError::ProviderUnavailable(FederatedProvider::Google))
        ));

        let user_id = provider.link_provider(FederatedProvider::Google, Some("g@example.com"), true);
        let session = provider
            .sign_in_with_provider(FederatedProvider::Google)
            .await
            .unwrap();
        assert_eq!(session.user_id, user_id);
        assert!(session.email_verified);
    }

    #[tokio::test]
    async fn test_sign_out_failure_is_one_shot() {
        let provider = MemoryIdentityProvider::new();
        let session = Session::new("uid", None, SignInMethod::Password);
        provider.fail_next_sign_out("network down");
        assert!(provider.sign_out(&session).await.is_err());
        assert!(provider.sign_out(&session).await.is_ok());
    }
}
