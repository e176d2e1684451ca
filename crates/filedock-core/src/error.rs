//! Error presentation shared by every Filedock error type.
//!
//! Each adapter crate owns its own `thiserror` enum (`AuthError`, `StoreError`,
//! `TransferError`). They all implement [`ErrorMetadata`] so the workflow layer
//! can turn any failure into a row message or banner without knowing which
//! adapter produced it.

use std::error::Error;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like bad credentials
    Debug,
    /// Warning level - for partial failures the user must act on
    Warn,
    /// Error level - for unexpected backend failures
    Error,
}

/// Metadata describing how an error is presented to the user
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORE_ERROR")
    fn error_code(&self) -> &'static str;

    /// User-facing message (may differ from the internal error message)
    fn client_message(&self) -> String;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// Whether the operation may be retried automatically.
    ///
    /// Nothing in Filedock retries on its own, so the default is `false`.
    fn is_recoverable(&self) -> bool {
        false
    }

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Render an error with its source chain, one cause per line.
pub fn error_chain(err: &dyn Error) -> String {
    let mut details = err.to_string();

    let mut source = err.source();
    let mut depth = 0;
    while let Some(cause) = source {
        depth += 1;
        if depth > 5 {
            details.push_str("\n  ... (truncated)");
            break;
        }
        details.push_str(&format!("\n  Caused by: {}", cause));
        source = cause.source();
    }

    details
}
