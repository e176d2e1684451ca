use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Persisted metadata for one user file.
///
/// `storage_key` is fixed at creation and is the only pointer to the stored
/// object; `name` is a display name and may change through rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct FileRecord {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub size: i64,
    pub content_type: String,
    pub storage_key: String,
    /// Assigned by the metadata store; absent on records written before the
    /// server timestamp resolved.
    pub created_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// Size as an unsigned byte count (negative sizes read as zero).
    pub fn size_bytes(&self) -> u64 {
        u64::try_from(self.size).unwrap_or(0)
    }
}

/// Payload for creating a [`FileRecord`]; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFileRecord {
    pub user_id: String,
    pub name: String,
    pub size: i64,
    pub content_type: String,
    pub storage_key: String,
}

/// A record prepared for display, with a freshly signed download URL.
///
/// The URL lives only as long as the listing that produced it and is never
/// written back to any store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileListing {
    pub record: FileRecord,
    pub download_url: Option<String>,
}

impl FileListing {
    pub fn new(record: FileRecord, download_url: Option<String>) -> Self {
        Self {
            record,
            download_url,
        }
    }
}
