#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{MemoryStorage, ObjectStorage, StorageBackend, TransferError, TransferResult, UrlSigner};
use filedock_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> TransferResult<Arc<dyn ObjectStorage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| TransferError::Config("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region().map(String::from).ok_or_else(|| {
                TransferError::Config("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = config.s3_endpoint.clone();

            let storage = S3Storage::new(bucket, region, endpoint).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(TransferError::Config(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                TransferError::Config("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                TransferError::Config("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;
            let secret = config.url_signing_secret.clone().ok_or_else(|| {
                TransferError::Config("URL_SIGNING_SECRET not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path, base_url, secret).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(TransferError::Config(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        StorageBackend::Memory => {
            let signer = match &config.url_signing_secret {
                Some(secret) => UrlSigner::new("memory://objects", secret.clone())?,
                None => UrlSigner::with_random_secret("memory://objects"),
            };
            Ok(Arc::new(MemoryStorage::new(signer)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filedock_core::MetadataBackend;

    // Validation runs in `Config::from_lookup`; start from a valid in-memory
    // config and override fields to reach the factory's own checks.
    fn memory_config() -> Config {
        Config::from_lookup(|key| match key {
            "STORAGE_BACKEND" => Some("memory".to_string()),
            "METADATA_BACKEND" => Some("memory".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_memory_storage() {
        let config = memory_config();
        assert_eq!(config.metadata_backend, MetadataBackend::Memory);
        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Memory);
    }

    #[cfg(feature = "storage-local")]
    #[tokio::test]
    async fn test_create_local_storage() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = memory_config();
        config.storage_backend = StorageBackend::Local;
        config.local_storage_path = Some(dir.path().to_string_lossy().to_string());
        config.local_storage_base_url = Some("http://localhost:8080/files".to_string());
        config.url_signing_secret = Some("0123456789abcdef0123456789abcdef".to_string());

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }

    #[cfg(feature = "storage-local")]
    #[tokio::test]
    async fn test_local_storage_requires_signing_secret() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = memory_config();
        config.storage_backend = StorageBackend::Local;
        config.local_storage_path = Some(dir.path().to_string_lossy().to_string());
        config.local_storage_base_url = Some("http://localhost:8080/files".to_string());

        let result = create_storage(&config).await;
        assert!(matches!(result, Err(TransferError::Config(_))));
    }

    #[cfg(feature = "storage-s3")]
    #[tokio::test]
    async fn test_s3_requires_bucket() {
        let mut config = memory_config();
        config.storage_backend = StorageBackend::S3;
        config.aws_region = Some("us-east-1".to_string());

        let result = create_storage(&config).await;
        assert!(matches!(result, Err(TransferError::Config(_))));
    }
}
