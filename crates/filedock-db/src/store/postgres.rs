use super::{sort_by_recency, validate_new_record, FileRecordStore};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use filedock_core::{Config, FileRecord, NewFileRecord};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use uuid::Uuid;

/// Open a connection pool using the database settings from `config`.
pub async fn connect(config: &Config) -> StoreResult<PgPool> {
    let url = config.database_url.as_deref().ok_or_else(|| {
        StoreError::Database(sqlx::Error::Configuration(
            "DATABASE_URL not configured".into(),
        ))
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .connect(url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to metadata database");
            StoreError::Database(e)
        })?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Connected to metadata database"
    );
    Ok(pool)
}

/// Apply the embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(sqlx::Error::from)?;
    Ok(())
}

/// PostgreSQL-backed file record store.
#[derive(Clone)]
pub struct PostgresFileRecordStore {
    pool: PgPool,
}

impl PostgresFileRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl FileRecordStore for PostgresFileRecordStore {
    #[tracing::instrument(skip(self, record), fields(
        db.system = "postgresql",
        db.table = "files",
        db.operation = "insert",
        user_id = %record.user_id
    ))]
    async fn create_record(&self, record: NewFileRecord) -> StoreResult<Uuid> {
        validate_new_record(&record)?;

        let id: Uuid = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            INSERT INTO files (id, user_id, name, size, content_type, storage_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.user_id)
        .bind(&record.name)
        .bind(record.size)
        .bind(&record.content_type)
        .bind(&record.storage_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                error = ?e,
                storage_key = %record.storage_key,
                "Failed to insert file record"
            );
            StoreError::Write(e.to_string())
        })?;

        Ok(id)
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "files",
        db.operation = "select"
    ))]
    async fn list_records(&self, user_id: &str) -> StoreResult<Vec<FileRecord>> {
        let mut records = sqlx::query_as::<Postgres, FileRecord>(
            r#"
            SELECT id, user_id, name, size, content_type, storage_key, created_at
            FROM files
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        sort_by_recency(&mut records);
        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(
        db.table = "files",
        db.operation = "select",
        db.record_id = %id
    ))]
    async fn get_record(&self, id: Uuid) -> StoreResult<Option<FileRecord>> {
        let record = sqlx::query_as::<Postgres, FileRecord>(
            r#"
            SELECT id, user_id, name, size, content_type, storage_key, created_at
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(
        db.table = "files",
        db.operation = "delete",
        db.record_id = %id
    ))]
    async fn delete_record(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(
        db.table = "files",
        db.operation = "update",
        db.record_id = %id
    ))]
    async fn rename_record(&self, id: Uuid, new_name: &str) -> StoreResult<()> {
        if new_name.trim().is_empty() {
            return Err(StoreError::InvalidRecord("file name is empty".to_string()));
        }

        let result = sqlx::query("UPDATE files SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(new_name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
