//! Data models shared across Filedock crates
//!
//! Each sub-module represents one feature area: files and their metadata,
//! identity sessions, and files picked for upload.

mod file_record;
mod selected_file;
mod session;

pub use file_record::*;
pub use selected_file::*;
pub use session::*;
