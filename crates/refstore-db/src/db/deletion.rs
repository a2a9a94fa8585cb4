//! Deletion request repository.

use async_trait::async_trait;
use chrono::Utc;
use refstore_core::models::{DeletionRequestStatus, FileDeletionRequest};
use refstore_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::traits::DeletionStore;

#[derive(Clone)]
pub struct DeletionRequestRepository {
    pool: PgPool,
}

impl DeletionRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeletionStore for DeletionRequestRepository {
    #[tracing::instrument(skip(self), fields(db.table = "file_deletion_requests", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<FileDeletionRequest>, AppError> {
        let row: Option<FileDeletionRequest> = sqlx::query_as::<Postgres, FileDeletionRequest>(
            "SELECT * FROM file_deletion_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_deletion_requests", db.operation = "select", file_reference_id = %file_reference_id))]
    async fn search(
        &self,
        file_reference_id: Uuid,
    ) -> Result<Option<FileDeletionRequest>, AppError> {
        let row: Option<FileDeletionRequest> = sqlx::query_as::<Postgres, FileDeletionRequest>(
            "SELECT * FROM file_deletion_requests WHERE file_reference_id = $1",
        )
        .bind(file_reference_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self, ids), fields(db.table = "file_deletion_requests", db.operation = "select", count = ids.len()))]
    async fn search_by_reference_ids(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<FileDeletionRequest>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<FileDeletionRequest> = sqlx::query_as::<Postgres, FileDeletionRequest>(
            "SELECT * FROM file_deletion_requests WHERE file_reference_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_deletion_requests", db.operation = "insert", file_reference_id = %file_reference_id))]
    async fn create(
        &self,
        file_reference_id: Uuid,
        force: bool,
        group_id: Option<&str>,
    ) -> Result<FileDeletionRequest, AppError> {
        let now = Utc::now();
        let row: FileDeletionRequest = sqlx::query_as::<Postgres, FileDeletionRequest>(
            r#"
            INSERT INTO file_deletion_requests (id, file_reference_id, status, force, group_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(file_reference_id)
        .bind(DeletionRequestStatus::Pending)
        .bind(force)
        .bind(group_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_deletion_requests", db.operation = "update", db.record_id = %id, status = %status))]
    async fn set_status(&self, id: Uuid, status: DeletionRequestStatus) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE file_deletion_requests SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_deletion_requests", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM file_deletion_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
