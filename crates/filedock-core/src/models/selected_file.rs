use bytes::Bytes;

use crate::constants::DEFAULT_CONTENT_TYPE;

/// A file picked by the user for upload.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl SelectedFile {
    /// Build a selection; an empty or missing content type falls back to
    /// `application/octet-stream`.
    pub fn new(name: impl Into<String>, content_type: Option<&str>, data: impl Into<Bytes>) -> Self {
        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        Self {
            name: name.into(),
            content_type,
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
