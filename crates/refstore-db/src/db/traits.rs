//! Store traits consumed by the service layer.
//!
//! The concrete Postgres repositories implement these; test helpers provide
//! in-memory implementations. Keeping the seam here lets the orchestrator
//! and status engine stay free of sqlx types.

use async_trait::async_trait;
use refstore_core::models::{
    DeletionRequestStatus, FileDeletionRequest, FileMetaInfo, FileReference, FileStorageRequest,
    GroupStatus, NewStorageRequest, RequestGroup, RequestResultInfo, StorageRequestStatus,
};
use refstore_core::AppError;
use uuid::Uuid;

/// Canonical (storage, checksum) -> FileReference mapping.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Insert a new reference. The caller guarantees no row exists for the
    /// natural key; a unique violation here is a contract bug and surfaces
    /// as a database error.
    async fn create(
        &self,
        owners: Vec<String>,
        meta: &FileMetaInfo,
        storage: &str,
        origin_url: Option<String>,
        referenced: bool,
    ) -> Result<FileReference, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<FileReference>, AppError>;

    async fn search(&self, storage: &str, checksum: &str)
        -> Result<Option<FileReference>, AppError>;

    /// Bulk lookup by checksum, one query for the whole batch.
    async fn search_by_checksums(&self, checksums: &[String])
        -> Result<Vec<FileReference>, AppError>;

    /// Bulk lookup by origin URL, one query for the whole batch.
    async fn search_by_urls(&self, urls: &[String]) -> Result<Vec<FileReference>, AppError>;

    /// Returns false when the owner was already present, so callers can
    /// distinguish Updated from Unmodified.
    async fn add_owner(&self, id: Uuid, owner: &str) -> Result<bool, AppError>;

    /// Re-reference an existing row: cancel a settled deletion request (when
    /// one is given) and add the owner, atomically. Returns false when the
    /// owner was already present.
    async fn adopt(
        &self,
        id: Uuid,
        owner: &str,
        cancel_deletion: Option<Uuid>,
    ) -> Result<bool, AppError>;

    async fn remove_owner(&self, id: Uuid, owner: &str)
        -> Result<Option<FileReference>, AppError>;

    /// Flag a queued action (deletion, archive) against the row.
    async fn set_pending_action(&self, id: Uuid, pending: bool) -> Result<(), AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

/// In-flight deletion intents per file reference.
#[async_trait]
pub trait DeletionStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<FileDeletionRequest>, AppError>;

    async fn search(
        &self,
        file_reference_id: Uuid,
    ) -> Result<Option<FileDeletionRequest>, AppError>;

    /// Bulk lookup for a batch of reference ids, one query.
    async fn search_by_reference_ids(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<FileDeletionRequest>, AppError>;

    async fn create(
        &self,
        file_reference_id: Uuid,
        force: bool,
        group_id: Option<&str>,
    ) -> Result<FileDeletionRequest, AppError>;

    async fn set_status(&self, id: Uuid, status: DeletionRequestStatus) -> Result<(), AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

/// Storage request aggregations.
#[async_trait]
pub trait StorageRequestStore: Send + Sync {
    async fn create(&self, request: NewStorageRequest) -> Result<FileStorageRequest, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<FileStorageRequest>, AppError>;

    /// All non-terminal requests for one natural key.
    async fn find_active_for_key(
        &self,
        storage: &str,
        checksum: &str,
    ) -> Result<Vec<FileStorageRequest>, AppError>;

    /// Merge additional owners into an existing aggregation (set semantics).
    async fn merge_owners(
        &self,
        id: Uuid,
        owners: &[String],
    ) -> Result<FileStorageRequest, AppError>;

    /// One bounded page of delayed requests, oldest first.
    async fn list_delayed(&self, limit: i64) -> Result<Vec<FileStorageRequest>, AppError>;

    async fn set_status(
        &self,
        id: Uuid,
        status: StorageRequestStatus,
        error_cause: Option<&str>,
    ) -> Result<(), AppError>;
}

/// Request groups and their per-item result rows.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Fails with [`AppError::DuplicateGroupId`] when the id already exists.
    async fn insert_granted(&self, group: &RequestGroup) -> Result<(), AppError>;

    async fn get(&self, group_id: &str) -> Result<Option<RequestGroup>, AppError>;

    async fn set_status(&self, group_id: &str, status: GroupStatus) -> Result<(), AppError>;

    async fn append_result(&self, info: &RequestResultInfo) -> Result<(), AppError>;

    /// (total, error) result counts for one group.
    async fn count_results(&self, group_id: &str) -> Result<(i64, i64), AppError>;

    async fn list_results(&self, group_id: &str) -> Result<Vec<RequestResultInfo>, AppError>;

    /// Groups still awaiting completion, oldest first.
    async fn list_open(&self, limit: i64) -> Result<Vec<RequestGroup>, AppError>;

    /// Cleanup hook invoked when a file reference is purged.
    async fn delete_results_for_file(&self, file_id: Uuid) -> Result<u64, AppError>;

    async fn delete(&self, group_id: &str) -> Result<(), AppError>;
}
