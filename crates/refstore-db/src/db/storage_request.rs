//! Storage request repository: aggregation rows and the delayed-page query
//! driving the promotion sweep.

use async_trait::async_trait;
use chrono::Utc;
use refstore_core::models::{FileStorageRequest, NewStorageRequest, StorageRequestStatus};
use refstore_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::traits::StorageRequestStore;

#[derive(Clone)]
pub struct StorageRequestRepository {
    pool: PgPool,
}

impl StorageRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StorageRequestStore for StorageRequestRepository {
    #[tracing::instrument(skip(self, request), fields(db.table = "file_storage_requests", db.operation = "insert", storage = %request.storage, checksum = %request.checksum))]
    async fn create(&self, request: NewStorageRequest) -> Result<FileStorageRequest, AppError> {
        let now = Utc::now();
        let row: FileStorageRequest = sqlx::query_as::<Postgres, FileStorageRequest>(
            r#"
            INSERT INTO file_storage_requests (
                id, owners, checksum, checksum_algorithm, file_name, size, mime_type,
                origin_url, storage, store_path, group_id, session_owner, session,
                status, error_cause, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NULL, $15, $15)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.owners)
        .bind(&request.checksum)
        .bind(&request.checksum_algorithm)
        .bind(&request.file_name)
        .bind(request.size)
        .bind(&request.mime_type)
        .bind(&request.origin_url)
        .bind(&request.storage)
        .bind(&request.store_path)
        .bind(&request.group_id)
        .bind(&request.session_owner)
        .bind(&request.session)
        .bind(request.status)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_storage_requests", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<FileStorageRequest>, AppError> {
        let row: Option<FileStorageRequest> = sqlx::query_as::<Postgres, FileStorageRequest>(
            "SELECT * FROM file_storage_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_storage_requests", db.operation = "select", storage = %storage, checksum = %checksum))]
    async fn find_active_for_key(
        &self,
        storage: &str,
        checksum: &str,
    ) -> Result<Vec<FileStorageRequest>, AppError> {
        let rows: Vec<FileStorageRequest> = sqlx::query_as::<Postgres, FileStorageRequest>(
            r#"
            SELECT * FROM file_storage_requests
            WHERE storage = $1 AND checksum = $2 AND status NOT IN ('done', 'error')
            ORDER BY created_at ASC
            "#,
        )
        .bind(storage)
        .bind(checksum)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self, owners), fields(db.table = "file_storage_requests", db.operation = "update", db.record_id = %id))]
    async fn merge_owners(
        &self,
        id: Uuid,
        owners: &[String],
    ) -> Result<FileStorageRequest, AppError> {
        let row: FileStorageRequest = sqlx::query_as::<Postgres, FileStorageRequest>(
            r#"
            UPDATE file_storage_requests
            SET owners = (SELECT array_agg(DISTINCT o) FROM unnest(owners || $2) AS t(o)),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owners)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_storage_requests", db.operation = "select", limit = limit))]
    async fn list_delayed(&self, limit: i64) -> Result<Vec<FileStorageRequest>, AppError> {
        let rows: Vec<FileStorageRequest> = sqlx::query_as::<Postgres, FileStorageRequest>(
            r#"
            SELECT * FROM file_storage_requests
            WHERE status = 'delayed'
            ORDER BY updated_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_storage_requests", db.operation = "update", db.record_id = %id, status = %status))]
    async fn set_status(
        &self,
        id: Uuid,
        status: StorageRequestStatus,
        error_cause: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE file_storage_requests
            SET status = $2, error_cause = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(error_cause)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
