use crate::keys::validate_key;
use crate::progress::ProgressReporter;
use crate::signing::UrlSigner;
use crate::traits::{ObjectStorage, TransferError, TransferResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// An object held by [`MemoryStorage`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// In-process object storage.
///
/// Used by tests and local development. Clones share the same objects.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    objects: Arc<DashMap<String, StoredObject>>,
    signer: UrlSigner,
}

impl MemoryStorage {
    pub fn new(signer: UrlSigner) -> Self {
        Self {
            objects: Arc::new(DashMap::new()),
            signer,
        }
    }

    /// Storage signing URLs under `memory://objects` with a random secret.
    pub fn ephemeral() -> Self {
        Self::new(UrlSigner::with_random_secret("memory://objects"))
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    pub fn get_object(&self, key: &str) -> Option<StoredObject> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        progress: &ProgressReporter,
    ) -> TransferResult<()> {
        validate_key(key)?;
        let size = body.len() as u64;

        self.objects.insert(
            key.to_string(),
            StoredObject {
                data: body,
                content_type: content_type.to_string(),
            },
        );
        progress.report(100);

        tracing::debug!(key = %key, size_bytes = size, "Memory storage upload successful");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> TransferResult<()> {
        validate_key(key)?;
        match self.objects.remove(key) {
            Some(_) => {
                tracing::debug!(key = %key, "Memory storage delete successful");
                Ok(())
            }
            None => Err(TransferError::NotFound(key.to_string())),
        }
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> TransferResult<String> {
        validate_key(key)?;
        self.signer.sign(key, expires_in)
    }

    async fn exists(&self, key: &str) -> TransferResult<bool> {
        validate_key(key)?;
        Ok(self.objects.contains_key(key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_overwrites_and_delete_removes() {
        let storage = MemoryStorage::ephemeral();
        let progress = ProgressReporter::disabled();

        storage
            .put_object("users/u/a.txt", Bytes::from_static(b"one"), "text/plain", &progress)
            .await
            .unwrap();
        storage
            .put_object("users/u/a.txt", Bytes::from_static(b"two"), "text/csv", &progress)
            .await
            .unwrap();

        let object = storage.get_object("users/u/a.txt").unwrap();
        assert_eq!(object.data, Bytes::from_static(b"two"));
        assert_eq!(object.content_type, "text/csv");
        assert_eq!(storage.len(), 1);

        storage.delete_object("users/u/a.txt").await.unwrap();
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let storage = MemoryStorage::ephemeral();
        let result = storage.delete_object("users/u/missing.txt").await;
        assert!(matches!(result, Err(TransferError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_clones_share_objects() {
        let storage = MemoryStorage::ephemeral();
        let clone = storage.clone();
        clone
            .put_object(
                "users/u/a.txt",
                Bytes::from_static(b"x"),
                "text/plain",
                &ProgressReporter::disabled(),
            )
            .await
            .unwrap();
        assert!(storage.exists("users/u/a.txt").await.unwrap());
        assert_eq!(storage.keys(), vec!["users/u/a.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_signed_url_verifies() {
        let storage = MemoryStorage::ephemeral();
        let url = storage
            .signed_url("users/u/a.txt", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.starts_with("memory://objects/users/u/a.txt?"));
        assert_eq!(storage.signer().verify(&url).unwrap(), "users/u/a.txt");
    }
}
