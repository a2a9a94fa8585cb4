//! Request group repository: group rows plus per-item result records.

use async_trait::async_trait;
use refstore_core::models::{GroupStatus, RequestGroup, RequestResultInfo};
use refstore_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::traits::GroupStore;

#[derive(Clone)]
pub struct RequestGroupRepository {
    pool: PgPool,
}

impl RequestGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupStore for RequestGroupRepository {
    #[tracing::instrument(skip(self, group), fields(db.table = "request_groups", db.operation = "insert", group_id = %group.id))]
    async fn insert_granted(&self, group: &RequestGroup) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO request_groups (id, request_type, expected_count, expiration_date, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&group.id)
        .bind(group.request_type)
        .bind(group.expected_count)
        .bind(group.expiration_date)
        .bind(group.status)
        .bind(group.created_at)
        .bind(group.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_database_error()
                    .is_some_and(|db| db.is_unique_violation()) =>
            {
                Err(AppError::DuplicateGroupId(group.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "request_groups", db.operation = "select", group_id = %group_id))]
    async fn get(&self, group_id: &str) -> Result<Option<RequestGroup>, AppError> {
        let row: Option<RequestGroup> = sqlx::query_as::<Postgres, RequestGroup>(
            "SELECT * FROM request_groups WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "request_groups", db.operation = "update", group_id = %group_id, status = %status))]
    async fn set_status(&self, group_id: &str, status: GroupStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE request_groups SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(group_id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, info), fields(db.table = "request_results", db.operation = "insert", group_id = %info.group_id))]
    async fn append_result(&self, info: &RequestResultInfo) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO request_results (
                id, group_id, checksum, storage, store_path, owners,
                file_reference_id, error_cause, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(info.id)
        .bind(&info.group_id)
        .bind(&info.checksum)
        .bind(&info.storage)
        .bind(&info.store_path)
        .bind(&info.owners)
        .bind(info.file_reference_id)
        .bind(&info.error_cause)
        .bind(info.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "request_results", db.operation = "select", group_id = %group_id))]
    async fn count_results(&self, group_id: &str) -> Result<(i64, i64), AppError> {
        let counts: (i64, i64) = sqlx::query_as::<Postgres, (i64, i64)>(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE error_cause IS NOT NULL)
            FROM request_results
            WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    #[tracing::instrument(skip(self), fields(db.table = "request_results", db.operation = "select", group_id = %group_id))]
    async fn list_results(&self, group_id: &str) -> Result<Vec<RequestResultInfo>, AppError> {
        let rows: Vec<RequestResultInfo> = sqlx::query_as::<Postgres, RequestResultInfo>(
            "SELECT * FROM request_results WHERE group_id = $1 ORDER BY created_at ASC",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "request_groups", db.operation = "select", limit = limit))]
    async fn list_open(&self, limit: i64) -> Result<Vec<RequestGroup>, AppError> {
        let rows: Vec<RequestGroup> = sqlx::query_as::<Postgres, RequestGroup>(
            r#"
            SELECT * FROM request_groups
            WHERE status = 'granted'
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "request_results", db.operation = "delete", file_id = %file_id))]
    async fn delete_results_for_file(&self, file_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM request_results WHERE file_reference_id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self), fields(db.table = "request_groups", db.operation = "delete", group_id = %group_id))]
    async fn delete(&self, group_id: &str) -> Result<(), AppError> {
        // Result rows cascade with the group.
        sqlx::query("DELETE FROM request_groups WHERE id = $1")
            .bind(group_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
