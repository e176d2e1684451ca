//! Shared key generation for storage backends.
//!
//! Key format: `users/{user_id}/{file_name}`.

use crate::traits::{TransferError, TransferResult};
use filedock_core::constants::USER_OBJECT_PREFIX;

/// Generate the object key for a user's file.
///
/// The key is derived only from the owner and the original file name; it is
/// computed once at upload time and stored with the metadata record.
pub fn user_object_key(user_id: &str, file_name: &str) -> TransferResult<String> {
    validate_segment(user_id, "user id")?;
    validate_segment(file_name, "file name")?;

    let key = format!("{}/{}/{}", USER_OBJECT_PREFIX, user_id, file_name);
    validate_key(&key)?;
    Ok(key)
}

/// Reject keys that could escape their prefix on a filesystem backend.
pub fn validate_key(key: &str) -> TransferResult<()> {
    if key.is_empty() {
        return Err(TransferError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') {
        return Err(TransferError::InvalidKey(
            "Storage key must not start with '/'".to_string(),
        ));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(TransferError::InvalidKey(format!(
            "Storage key contains an invalid path segment: {}",
            key
        )));
    }
    Ok(())
}

fn validate_segment(value: &str, what: &str) -> TransferResult<()> {
    if value.trim().is_empty() {
        return Err(TransferError::InvalidKey(format!("The {} is empty", what)));
    }
    if value.contains('/') || value.contains('\\') {
        return Err(TransferError::InvalidKey(format!(
            "The {} must not contain path separators",
            what
        )));
    }
    if value == "." || value == ".." {
        return Err(TransferError::InvalidKey(format!(
            "The {} is not a valid name",
            what
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_object_key_layout() {
        let key = user_object_key("uid-42", "report.pdf").unwrap();
        assert_eq!(key, "users/uid-42/report.pdf");
    }

    #[test]
    fn test_user_object_key_keeps_dots_inside_names() {
        let key = user_object_key("uid-42", "archive..v2.tar.gz").unwrap();
        assert_eq!(key, "users/uid-42/archive..v2.tar.gz");
    }

    #[test]
    fn test_user_object_key_rejects_separators_and_traversal() {
        assert!(matches!(
            user_object_key("uid", "../etc/passwd"),
            Err(TransferError::InvalidKey(_))
        ));
        assert!(matches!(
            user_object_key("uid", "dir\\file.txt"),
            Err(TransferError::InvalidKey(_))
        ));
        assert!(matches!(
            user_object_key("uid", ".."),
            Err(TransferError::InvalidKey(_))
        ));
        assert!(matches!(
            user_object_key("", "file.txt"),
            Err(TransferError::InvalidKey(_))
        ));
        assert!(matches!(
            user_object_key("uid", "   "),
            Err(TransferError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("users/u/a.txt").is_ok());
        assert!(validate_key("/users/u/a.txt").is_err());
        assert!(validate_key("users//a.txt").is_err());
        assert!(validate_key("users/../a.txt").is_err());
        assert!(validate_key("").is_err());
    }
}
