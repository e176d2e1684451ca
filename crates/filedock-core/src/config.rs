//! Configuration module
//!
//! Connection settings for the object store and metadata store, plus the few
//! knobs the workflow exposes (signed URL lifetime, upload size limit).

use std::env;
use std::time::Duration;

use crate::constants::DEFAULT_SIGNED_URL_EXPIRY_SECS;
use crate::storage_types::{MetadataBackend, StorageBackend};

// Common constants
const DB_MAX_CONNECTIONS: u32 = 10;
const DB_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_SIZE_MB: u64 = 100;
const MIN_SIGNING_SECRET_LEN: usize = 32;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    // Object storage
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub url_signing_secret: Option<String>,
    pub signed_url_expiry_secs: u64,
    pub max_upload_size_bytes: u64,
    // Metadata store
    pub metadata_backend: MetadataBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
}

impl Config {
    /// Load configuration from the process environment (after reading `.env`).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = non_empty("ENVIRONMENT")
            .or_else(|| non_empty("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let storage_backend = match non_empty("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::S3,
        };

        let metadata_backend = match non_empty("METADATA_BACKEND") {
            Some(raw) => raw.parse()?,
            None => MetadataBackend::Postgres,
        };

        let max_upload_size_mb = non_empty("MAX_UPLOAD_SIZE_MB")
            .and_then(|v| v.parse().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB);
        let max_upload_size_bytes = max_upload_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "MAX_UPLOAD_SIZE_MB is too large: {} MB does not fit in a byte count",
                    max_upload_size_mb
                )
            })?;

        let config = Config {
            environment,
            storage_backend,
            s3_bucket: non_empty("S3_BUCKET"),
            s3_region: non_empty("S3_REGION"),
            s3_endpoint: non_empty("S3_ENDPOINT"),
            aws_region: non_empty("AWS_REGION"),
            local_storage_path: non_empty("LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty("LOCAL_STORAGE_BASE_URL"),
            url_signing_secret: non_empty("URL_SIGNING_SECRET"),
            signed_url_expiry_secs: non_empty("SIGNED_URL_EXPIRY_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|&secs: &u64| secs > 0)
                .unwrap_or(DEFAULT_SIGNED_URL_EXPIRY_SECS),
            max_upload_size_bytes,
            metadata_backend,
            database_url: non_empty("DATABASE_URL"),
            db_max_connections: non_empty("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DB_MAX_CONNECTIONS),
            db_timeout_seconds: non_empty("DB_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DB_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn signed_url_expiry(&self) -> Duration {
        Duration::from_secs(self.signed_url_expiry_secs)
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref().or(self.aws_region.as_deref())
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region().is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
                self.validate_signing_secret()?;
            }
            StorageBackend::Memory => {
                if self.is_production() {
                    return Err(anyhow::anyhow!(
                        "memory storage backend cannot be used in production"
                    ));
                }
            }
        }

        if self.metadata_backend == MetadataBackend::Postgres {
            match self.database_url.as_deref() {
                Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {}
                Some(_) => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ))
                }
                None => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be set when using the postgres metadata backend"
                    ))
                }
            }
        }

        Ok(())
    }

    fn validate_signing_secret(&self) -> Result<(), anyhow::Error> {
        match self.url_signing_secret.as_deref() {
            Some(secret) if secret.len() >= MIN_SIGNING_SECRET_LEN => Ok(()),
            Some(_) => Err(anyhow::anyhow!(
                "URL_SIGNING_SECRET must be at least {} characters long",
                MIN_SIGNING_SECRET_LEN
            )),
            None => Err(anyhow::anyhow!(
                "URL_SIGNING_SECRET must be set when using local storage backend"
            )),
        }
    }
}
