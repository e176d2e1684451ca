/// Lifetime of a signed download URL when nothing else is configured (15 minutes).
pub const DEFAULT_SIGNED_URL_EXPIRY_SECS: u64 = 900;

/// Top-level prefix of every user-owned object key.
pub const USER_OBJECT_PREFIX: &str = "users";

/// Content type recorded when the file picker does not report one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
