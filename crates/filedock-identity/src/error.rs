use filedock_core::{ErrorMetadata, FederatedProvider, LogLevel};
use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("You must be logged in to upload files.")]
    NotSignedIn,

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("An account already exists for this email")]
    EmailInUse,

    #[error("No account found for this email")]
    UserNotFound,

    #[error("Incorrect password")]
    WrongPassword,

    #[error("The {0} sign-in popup was closed before completing the sign in")]
    ProviderUnavailable(FederatedProvider),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

impl ErrorMetadata for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            AuthError::NotSignedIn => "NOT_SIGNED_IN",
            AuthError::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            AuthError::EmailInUse => "EMAIL_IN_USE",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::WrongPassword => "WRONG_PASSWORD",
            AuthError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            AuthError::Provider(_) => "IDENTITY_PROVIDER_ERROR",
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AuthError::NotSignedIn => Some("Log in and try again"),
            AuthError::EmailInUse => Some("Log in instead, or use another email"),
            AuthError::UserNotFound => Some("Sign up first"),
            AuthError::WrongPassword | AuthError::InvalidCredentials(_) => {
                Some("Check your email and password")
            }
            AuthError::ProviderUnavailable(_) => Some("Start the sign in again"),
            AuthError::Provider(_) => Some("Try again in a moment"),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AuthError::Provider(_) => LogLevel::Error,
            _ => LogLevel::Debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_signed_in_message() {
        assert_eq!(
            AuthError::NotSignedIn.client_message(),
            "You must be logged in to upload files."
        );
    }

    #[test]
    fn test_provider_unavailable_names_provider() {
        let err = AuthError::ProviderUnavailable(FederatedProvider::Google);
        assert!(err.to_string().contains("google"));
        assert_eq!(err.log_level(), LogLevel::Debug);
    }
}
