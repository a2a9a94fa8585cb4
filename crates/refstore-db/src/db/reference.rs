//! File reference repository: canonical (storage, checksum) mapping.

use async_trait::async_trait;
use chrono::Utc;
use refstore_core::models::{FileMetaInfo, FileReference};
use refstore_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::traits::ReferenceStore;
use super::transaction::TransactionGuard;

#[derive(Clone)]
pub struct FileReferenceRepository {
    pool: PgPool,
}

impl FileReferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceStore for FileReferenceRepository {
    #[tracing::instrument(skip(self, owners, meta), fields(db.table = "file_references", db.operation = "insert", storage = %storage, checksum = %meta.checksum))]
    async fn create(
        &self,
        owners: Vec<String>,
        meta: &FileMetaInfo,
        storage: &str,
        origin_url: Option<String>,
        referenced: bool,
    ) -> Result<FileReference, AppError> {
        let now = Utc::now();
        let row: FileReference = sqlx::query_as::<Postgres, FileReference>(
            r#"
            INSERT INTO file_references (
                id, storage, checksum, checksum_algorithm, file_name, mime_type,
                size, width, height, kind, archived, origin_url, owners,
                referenced, pending_action, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, false, $11, $12, $13, false, $14, $14)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(storage)
        .bind(&meta.checksum)
        .bind(&meta.checksum_algorithm)
        .bind(&meta.file_name)
        .bind(&meta.mime_type)
        .bind(meta.size)
        .bind(meta.width)
        .bind(meta.height)
        .bind(&meta.kind)
        .bind(&origin_url)
        .bind(&owners)
        .bind(referenced)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_references", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<FileReference>, AppError> {
        let row: Option<FileReference> = sqlx::query_as::<Postgres, FileReference>(
            "SELECT * FROM file_references WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_references", db.operation = "select", storage = %storage, checksum = %checksum))]
    async fn search(
        &self,
        storage: &str,
        checksum: &str,
    ) -> Result<Option<FileReference>, AppError> {
        let row: Option<FileReference> = sqlx::query_as::<Postgres, FileReference>(
            "SELECT * FROM file_references WHERE storage = $1 AND checksum = $2",
        )
        .bind(storage)
        .bind(checksum)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self, checksums), fields(db.table = "file_references", db.operation = "select", count = checksums.len()))]
    async fn search_by_checksums(
        &self,
        checksums: &[String],
    ) -> Result<Vec<FileReference>, AppError> {
        if checksums.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<FileReference> = sqlx::query_as::<Postgres, FileReference>(
            "SELECT * FROM file_references WHERE checksum = ANY($1)",
        )
        .bind(checksums)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self, urls), fields(db.table = "file_references", db.operation = "select", count = urls.len()))]
    async fn search_by_urls(&self, urls: &[String]) -> Result<Vec<FileReference>, AppError> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<FileReference> = sqlx::query_as::<Postgres, FileReference>(
            "SELECT * FROM file_references WHERE origin_url = ANY($1)",
        )
        .bind(urls)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_references", db.operation = "update", db.record_id = %id, owner = %owner))]
    async fn add_owner(&self, id: Uuid, owner: &str) -> Result<bool, AppError> {
        // The guard in the WHERE clause makes this a no-op when the owner is
        // already present; rows_affected tells the caller which case it was.
        let result = sqlx::query(
            r#"
            UPDATE file_references
            SET owners = array_append(owners, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(owners))
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_references", db.operation = "update", db.record_id = %id, owner = %owner))]
    async fn adopt(
        &self,
        id: Uuid,
        owner: &str,
        cancel_deletion: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        if let Some(deletion_id) = cancel_deletion {
            sqlx::query("DELETE FROM file_deletion_requests WHERE id = $1")
                .bind(deletion_id)
                .execute(&mut **tx)
                .await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE file_references
            SET owners = array_append(owners, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(owners))
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&mut **tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_references", db.operation = "update", db.record_id = %id, owner = %owner))]
    async fn remove_owner(
        &self,
        id: Uuid,
        owner: &str,
    ) -> Result<Option<FileReference>, AppError> {
        let row: Option<FileReference> = sqlx::query_as::<Postgres, FileReference>(
            r#"
            UPDATE file_references
            SET owners = array_remove(owners, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_references", db.operation = "update", db.record_id = %id))]
    async fn set_pending_action(&self, id: Uuid, pending: bool) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE file_references SET pending_action = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(pending)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_references", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM file_references WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
