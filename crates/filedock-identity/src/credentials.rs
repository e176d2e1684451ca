use validator::Validate;

use crate::error::AuthError;

/// Email/password pair submitted to sign up.
#[derive(Debug, Clone, Validate)]
pub struct Credentials {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(
        min = 6,
        message = "Password should be at least 6 characters"
    ))]
    pub password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }

    /// Validate and convert failures into [`AuthError::InvalidCredentials`].
    pub fn check(&self) -> Result<(), AuthError> {
        self.validate().map_err(|errors| {
            let mut messages: Vec<String> = errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid {}", field))
                    })
                })
                .collect();
            messages.sort();
            AuthError::InvalidCredentials(messages.join("; "))
        })
    }

    /// Lowercased email used as the account key.
    pub fn normalized_email(&self) -> String {
        self.email.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_credentials() {
        assert!(Credentials::new(" a@example.com ", "secret").check().is_ok());
    }

    #[test]
    fn test_short_password() {
        let err = Credentials::new("a@example.com", "12345").check().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Password should be at least 6 characters"
        );
    }

    #[test]
    fn test_bad_email_and_password() {
        let err = Credentials::new("not-an-email", "1").check().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid email address; Password should be at least 6 characters"
        );
    }
}
