use crate::keys::validate_key;
use crate::progress::ProgressReporter;
use crate::signing::UrlSigner;
use crate::traits::{ObjectStorage, TransferError, TransferResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Bytes written between two progress reports.
const WRITE_CHUNK_SIZE: usize = 64 * 1024;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    signer: UrlSigner,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/filedock/objects")
    /// * `base_url` - Base URL the objects are served from (e.g., "http://localhost:8080/files")
    /// * `signing_secret` - HMAC secret for download URLs
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signing_secret: impl Into<Vec<u8>>,
    ) -> TransferResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            TransferError::Config(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            signer: UrlSigner::new(base_url, signing_secret)?,
        })
    }

    /// Signer used for download URLs, for the component that serves them.
    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// Check a download URL produced by this storage and return its key.
    ///
    /// Fails with [`TransferError::Signing`] for a foreign, tampered or
    /// expired URL.
    pub fn verify_signed_url(&self, url: &str) -> TransferResult<String> {
        let key = self.signer.verify(url)?;
        self.key_to_path(&key)?;
        Ok(key)
    }

    /// Convert an object key to a filesystem path with security validation
    ///
    /// Rejects keys with traversal segments and keys resolving outside the
    /// base directory.
    fn key_to_path(&self, key: &str) -> TransferResult<PathBuf> {
        validate_key(key)?;

        let path = self.base_path.join(key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            TransferError::Config(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(TransferError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> TransferResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        _content_type: &str,
        progress: &ProgressReporter,
    ) -> TransferResult<()> {
        let path = self.key_to_path(key)?;
        let total = body.len() as u64;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            TransferError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let mut written = 0u64;
        for chunk in body.chunks(WRITE_CHUNK_SIZE) {
            file.write_all(chunk).await.map_err(|e| {
                TransferError::UploadFailed(format!(
                    "Failed to write file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            written += chunk.len() as u64;
            progress.report_bytes(written, total);
        }

        file.sync_all().await.map_err(|e| {
            TransferError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;
        progress.report(100);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = total,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn delete_object(&self, key: &str) -> TransferResult<()> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        // Only a confirmed absence is NotFound; the workflow treats it as already deleted.
        if !fs::try_exists(&path).await? {
            return Err(TransferError::NotFound(key.to_string()));
        }

        fs::remove_file(&path).await.map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path.display(),
                key = %key,
                "Local storage delete failed"
            );
            TransferError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> TransferResult<String> {
        self.key_to_path(key)?;
        self.signer.sign(key, expires_in)
    }

    async fn exists(&self, key: &str) -> TransferResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
