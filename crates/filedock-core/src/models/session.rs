use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Federated identity providers supported for popup-style sign-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FederatedProvider {
    Google,
    Github,
}

impl Display for FederatedProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FederatedProvider::Google => write!(f, "google"),
            FederatedProvider::Github => write!(f, "github"),
        }
    }
}

/// How a session was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "provider", rename_all = "lowercase")]
pub enum SignInMethod {
    Password,
    Federated(FederatedProvider),
}

/// Authenticated session issued by the identity gateway.
///
/// `session_id` is unique per sign-in so that a completion arriving after a
/// sign-out (or after a different user signed in) can be recognised as stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub method: SignInMethod,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, email: Option<String>, method: SignInMethod) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id: user_id.into(),
            email,
            email_verified: false,
            method,
            issued_at: Utc::now(),
        }
    }

    pub fn with_email_verified(mut self, verified: bool) -> Self {
        self.email_verified = verified;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_session_gets_a_distinct_id() {
        let a = Session::new("uid-1", None, SignInMethod::Password);
        let b = Session::new("uid-1", None, SignInMethod::Password);
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(a.user_id, b.user_id);
    }

    #[test]
    fn test_sign_in_method_serialization() {
        let json =
            serde_json::to_value(SignInMethod::Federated(FederatedProvider::Google)).unwrap();
        assert_eq!(json["method"], "federated");
        assert_eq!(json["provider"], "google");
    }
}
