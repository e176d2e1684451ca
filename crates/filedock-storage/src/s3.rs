use crate::keys::validate_key;
use crate::progress::ProgressReporter;
use crate::traits::{ObjectStorage, TransferError, TransferResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, MultipartUpload, ObjectStore, ObjectStoreExt, PutMultipartOptions,
    PutOptions, PutPayload, Result as ObjectResult,
};
use std::time::Duration;

/// Bodies larger than this are sent as a multipart upload, one part at a time.
const MULTIPART_PART_SIZE: usize = 8 * 1024 * 1024;

fn content_type_attributes(content_type: &str) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());
    attributes
}

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> TransferResult<Self> {
        // Credentials come from the environment; bucket and region are explicit.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| TransferError::Config(e.to_string()))?;

        Ok(S3Storage { store, bucket })
    }

    async fn put_single(
        &self,
        location: &Path,
        body: Bytes,
        content_type: &str,
    ) -> ObjectResult<()> {
        let opts = PutOptions {
            attributes: content_type_attributes(content_type),
            ..Default::default()
        };
        self.store
            .put_opts(location, PutPayload::from(body), opts)
            .await?;
        Ok(())
    }

    async fn put_in_parts(
        &self,
        location: &Path,
        body: Bytes,
        content_type: &str,
        progress: &ProgressReporter,
    ) -> ObjectResult<()> {
        let total = body.len() as u64;
        let opts = PutMultipartOptions {
            attributes: content_type_attributes(content_type),
            ..Default::default()
        };
        let mut upload = self.store.put_multipart_opts(location, opts).await?;

        let mut sent = 0u64;
        let mut offset = 0usize;
        while offset < body.len() {
            let end = (offset + MULTIPART_PART_SIZE).min(body.len());
            let part = body.slice(offset..end);
            if let Err(e) = upload.put_part(PutPayload::from(part)).await {
                if let Err(abort_err) = upload.abort().await {
                    tracing::warn!(
                        error = %abort_err,
                        bucket = %self.bucket,
                        key = %location,
                        "S3 multipart abort failed"
                    );
                }
                return Err(e);
            }
            sent += (end - offset) as u64;
            offset = end;
            progress.report_bytes(sent, total);
        }

        upload.complete().await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        progress: &ProgressReporter,
    ) -> TransferResult<()> {
        validate_key(key)?;
        let size = body.len() as u64;
        let location = Path::from(key.to_string());

        let start = std::time::Instant::now();

        let result = if body.len() <= MULTIPART_PART_SIZE {
            self.put_single(&location, body, content_type).await
        } else {
            self.put_in_parts(&location, body, content_type, progress).await
        };

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            TransferError::UploadFailed(e.to_string())
        })?;
        progress.report(100);

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn delete_object(&self, key: &str) -> TransferResult<()> {
        validate_key(key)?;
        let start = std::time::Instant::now();

        // S3 deletes are idempotent; a missing object must still surface as NotFound.
        if !self.exists(key).await? {
            return Err(TransferError::NotFound(key.to_string()));
        }

        let location = Path::from(key.to_string());
        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            TransferError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> TransferResult<String> {
        validate_key(key)?;
        let location = Path::from(key.to_string());
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| TransferError::Signing(e.to_string()))?
            .to_string();

        Ok(url)
    }

    async fn exists(&self, key: &str) -> TransferResult<bool> {
        validate_key(key)?;
        let location = Path::from(key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(TransferError::Backend(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_s3_storage_builds_without_network() {
        let storage = S3Storage::new(
            "filedock-test".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::S3);
    }

    #[tokio::test]
    async fn test_s3_rejects_invalid_keys_before_any_request() {
        let storage = S3Storage::new("filedock-test".to_string(), "us-east-1".to_string(), None)
            .await
            .unwrap();
        let result = storage.exists("users/../x").await;
        assert!(matches!(result, Err(TransferError::InvalidKey(_))));
    }

    #[test]
    fn test_content_type_attributes() {
        let attributes = content_type_attributes("application/pdf");
        let value: &str = attributes.get(&Attribute::ContentType).unwrap().as_ref();
        assert_eq!(value, "application/pdf");
        assert_eq!(attributes.len(), 1);
    }
}
