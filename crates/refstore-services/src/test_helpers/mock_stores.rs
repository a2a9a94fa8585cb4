//! In-memory store implementations for testing without a database.
//!
//! [`InMemoryStore`] backs all four store traits with shared maps, so
//! cross-store operations (adopt cancelling a deletion request) behave like
//! the real repositories. It also enforces the natural-key uniqueness the
//! database constraint would, turning contract violations into test
//! failures instead of silent duplicates.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use refstore_core::events::{FileReferenceEvent, RequestsGroupEvent};
use refstore_core::models::{
    DeletionRequestStatus, FileDeletionRequest, FileMetaInfo, FileReference, FileStorageRequest,
    GroupStatus, NewStorageRequest, RequestGroup, RequestResultInfo, SessionInfo,
    StorageRequestStatus,
};
use refstore_core::{AppError, EventPublisher, SessionNotifier};
use refstore_db::{DeletionStore, GroupStore, ReferenceStore, StorageRequestStore};

#[derive(Default)]
struct Tables {
    references: HashMap<Uuid, FileReference>,
    deletions: HashMap<Uuid, FileDeletionRequest>,
    storage_requests: HashMap<Uuid, FileStorageRequest>,
    groups: HashMap<String, RequestGroup>,
    results: Vec<RequestResultInfo>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference_count(&self) -> usize {
        self.tables.lock().unwrap().references.len()
    }

    pub fn deletion_requests(&self) -> Vec<FileDeletionRequest> {
        self.tables.lock().unwrap().deletions.values().cloned().collect()
    }

    pub fn storage_requests(&self) -> Vec<FileStorageRequest> {
        self.tables
            .lock()
            .unwrap()
            .storage_requests
            .values()
            .cloned()
            .collect()
    }

    pub fn group(&self, group_id: &str) -> Option<RequestGroup> {
        self.tables.lock().unwrap().groups.get(group_id).cloned()
    }

    pub fn results(&self, group_id: &str) -> Vec<RequestResultInfo> {
        self.tables
            .lock()
            .unwrap()
            .results
            .iter()
            .filter(|r| r.group_id == group_id)
            .cloned()
            .collect()
    }

    /// Seed an already-existing deletion request with the given status.
    pub fn seed_deletion(&self, file_reference_id: Uuid, status: DeletionRequestStatus) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().deletions.insert(
            id,
            FileDeletionRequest {
                id,
                file_reference_id,
                status,
                force: false,
                group_id: None,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }
}

#[async_trait]
impl ReferenceStore for InMemoryStore {
    async fn create(
        &self,
        owners: Vec<String>,
        meta: &FileMetaInfo,
        storage: &str,
        origin_url: Option<String>,
        referenced: bool,
    ) -> Result<FileReference, AppError> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .references
            .values()
            .any(|r| r.storage == storage && r.checksum == meta.checksum)
        {
            return Err(AppError::Internal(format!(
                "duplicate file reference for ({}, {})",
                storage, meta.checksum
            )));
        }

        let now = Utc::now();
        let reference = FileReference {
            id: Uuid::new_v4(),
            storage: storage.to_string(),
            checksum: meta.checksum.clone(),
            checksum_algorithm: meta.checksum_algorithm.clone(),
            file_name: meta.file_name.clone(),
            mime_type: meta.mime_type.clone(),
            size: meta.size,
            width: meta.width,
            height: meta.height,
            kind: meta.kind.clone(),
            archived: false,
            origin_url,
            owners,
            referenced,
            pending_action: false,
            created_at: now,
            updated_at: now,
        };
        tables.references.insert(reference.id, reference.clone());
        Ok(reference)
    }

    async fn get(&self, id: Uuid) -> Result<Option<FileReference>, AppError> {
        Ok(self.tables.lock().unwrap().references.get(&id).cloned())
    }

    async fn search(
        &self,
        storage: &str,
        checksum: &str,
    ) -> Result<Option<FileReference>, AppError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .references
            .values()
            .find(|r| r.storage == storage && r.checksum == checksum)
            .cloned())
    }

    async fn search_by_checksums(
        &self,
        checksums: &[String],
    ) -> Result<Vec<FileReference>, AppError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .references
            .values()
            .filter(|r| checksums.contains(&r.checksum))
            .cloned()
            .collect())
    }

    async fn search_by_urls(&self, urls: &[String]) -> Result<Vec<FileReference>, AppError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .references
            .values()
            .filter(|r| r.origin_url.as_ref().is_some_and(|u| urls.contains(u)))
            .cloned()
            .collect())
    }

    async fn add_owner(&self, id: Uuid, owner: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().unwrap();
        let reference = tables
            .references
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("file reference {}", id)))?;
        if reference.has_owner(owner) {
            Ok(false)
        } else {
            reference.owners.push(owner.to_string());
            reference.updated_at = Utc::now();
            Ok(true)
        }
    }

    async fn adopt(
        &self,
        id: Uuid,
        owner: &str,
        cancel_deletion: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(deletion_id) = cancel_deletion {
            tables.deletions.remove(&deletion_id);
        }
        let reference = tables
            .references
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("file reference {}", id)))?;
        if reference.has_owner(owner) {
            Ok(false)
        } else {
            reference.owners.push(owner.to_string());
            reference.updated_at = Utc::now();
            Ok(true)
        }
    }

    async fn remove_owner(
        &self,
        id: Uuid,
        owner: &str,
    ) -> Result<Option<FileReference>, AppError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(reference) = tables.references.get_mut(&id) else {
            return Ok(None);
        };
        reference.owners.retain(|o| o != owner);
        reference.updated_at = Utc::now();
        Ok(Some(reference.clone()))
    }

    async fn set_pending_action(&self, id: Uuid, pending: bool) -> Result<(), AppError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(reference) = tables.references.get_mut(&id) {
            reference.pending_action = pending;
            reference.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.tables.lock().unwrap().references.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl DeletionStore for InMemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<FileDeletionRequest>, AppError> {
        Ok(self.tables.lock().unwrap().deletions.get(&id).cloned())
    }

    async fn search(
        &self,
        file_reference_id: Uuid,
    ) -> Result<Option<FileDeletionRequest>, AppError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .deletions
            .values()
            .find(|d| d.file_reference_id == file_reference_id)
            .cloned())
    }

    async fn search_by_reference_ids(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<FileDeletionRequest>, AppError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .deletions
            .values()
            .filter(|d| ids.contains(&d.file_reference_id))
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        file_reference_id: Uuid,
        force: bool,
        group_id: Option<&str>,
    ) -> Result<FileDeletionRequest, AppError> {
        let now = Utc::now();
        let request = FileDeletionRequest {
            id: Uuid::new_v4(),
            file_reference_id,
            status: DeletionRequestStatus::Pending,
            force,
            group_id: group_id.map(|s| s.to_string()),
            created_at: now,
            updated_at: now,
        };
        self.tables
            .lock()
            .unwrap()
            .deletions
            .insert(request.id, request.clone());
        Ok(request)
    }

    async fn set_status(&self, id: Uuid, status: DeletionRequestStatus) -> Result<(), AppError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(request) = tables.deletions.get_mut(&id) {
            request.status = status;
            request.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.tables.lock().unwrap().deletions.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl StorageRequestStore for InMemoryStore {
    async fn create(&self, request: NewStorageRequest) -> Result<FileStorageRequest, AppError> {
        let now = Utc::now();
        let row = FileStorageRequest {
            id: Uuid::new_v4(),
            owners: request.owners,
            checksum: request.checksum,
            checksum_algorithm: request.checksum_algorithm,
            file_name: request.file_name,
            size: request.size,
            mime_type: request.mime_type,
            origin_url: request.origin_url,
            storage: request.storage,
            store_path: request.store_path,
            group_id: request.group_id,
            session_owner: request.session_owner,
            session: request.session,
            status: request.status,
            error_cause: None,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .lock()
            .unwrap()
            .storage_requests
            .insert(row.id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<FileStorageRequest>, AppError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .storage_requests
            .get(&id)
            .cloned())
    }

    async fn find_active_for_key(
        &self,
        storage: &str,
        checksum: &str,
    ) -> Result<Vec<FileStorageRequest>, AppError> {
        let mut rows: Vec<FileStorageRequest> = self
            .tables
            .lock()
            .unwrap()
            .storage_requests
            .values()
            .filter(|r| r.storage == storage && r.checksum == checksum && !r.status.is_terminal())
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    async fn merge_owners(
        &self,
        id: Uuid,
        owners: &[String],
    ) -> Result<FileStorageRequest, AppError> {
        let mut tables = self.tables.lock().unwrap();
        let request = tables
            .storage_requests
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("storage request {}", id)))?;
        for owner in owners {
            if !request.owners.contains(owner) {
                request.owners.push(owner.clone());
            }
        }
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn list_delayed(&self, limit: i64) -> Result<Vec<FileStorageRequest>, AppError> {
        let mut rows: Vec<FileStorageRequest> = self
            .tables
            .lock()
            .unwrap()
            .storage_requests
            .values()
            .filter(|r| r.status == StorageRequestStatus::Delayed)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.updated_at);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: StorageRequestStatus,
        error_cause: Option<&str>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(request) = tables.storage_requests.get_mut(&id) {
            request.status = status;
            request.error_cause = error_cause.map(|s| s.to_string());
            request.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl GroupStore for InMemoryStore {
    async fn insert_granted(&self, group: &RequestGroup) -> Result<(), AppError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.groups.contains_key(&group.id) {
            return Err(AppError::DuplicateGroupId(group.id.clone()));
        }
        tables.groups.insert(group.id.clone(), group.clone());
        Ok(())
    }

    async fn get(&self, group_id: &str) -> Result<Option<RequestGroup>, AppError> {
        Ok(self.tables.lock().unwrap().groups.get(group_id).cloned())
    }

    async fn set_status(&self, group_id: &str, status: GroupStatus) -> Result<(), AppError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(group) = tables.groups.get_mut(group_id) {
            group.status = status;
            group.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn append_result(&self, info: &RequestResultInfo) -> Result<(), AppError> {
        self.tables.lock().unwrap().results.push(info.clone());
        Ok(())
    }

    async fn count_results(&self, group_id: &str) -> Result<(i64, i64), AppError> {
        let tables = self.tables.lock().unwrap();
        let total = tables
            .results
            .iter()
            .filter(|r| r.group_id == group_id)
            .count() as i64;
        let errors = tables
            .results
            .iter()
            .filter(|r| r.group_id == group_id && r.is_error())
            .count() as i64;
        Ok((total, errors))
    }

    async fn list_results(&self, group_id: &str) -> Result<Vec<RequestResultInfo>, AppError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .results
            .iter()
            .filter(|r| r.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn list_open(&self, limit: i64) -> Result<Vec<RequestGroup>, AppError> {
        let mut rows: Vec<RequestGroup> = self
            .tables
            .lock()
            .unwrap()
            .groups
            .values()
            .filter(|g| g.status == GroupStatus::Granted)
            .cloned()
            .collect();
        rows.sort_by_key(|g| g.created_at);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn delete_results_for_file(&self, file_id: Uuid) -> Result<u64, AppError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.results.len();
        tables
            .results
            .retain(|r| r.file_reference_id != Some(file_id));
        Ok((before - tables.results.len()) as u64)
    }

    async fn delete(&self, group_id: &str) -> Result<(), AppError> {
        let mut tables = self.tables.lock().unwrap();
        tables.groups.remove(group_id);
        tables.results.retain(|r| r.group_id != group_id);
        Ok(())
    }
}

/// Event publisher that records everything it is given.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    file_events: Arc<Mutex<Vec<FileReferenceEvent>>>,
    group_events: Arc<Mutex<Vec<RequestsGroupEvent>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_events(&self) -> Vec<FileReferenceEvent> {
        self.file_events.lock().unwrap().clone()
    }

    pub fn group_events(&self) -> Vec<RequestsGroupEvent> {
        self.group_events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_file_event(&self, event: FileReferenceEvent) {
        self.file_events.lock().unwrap().push(event);
    }

    async fn publish_group_event(&self, event: RequestsGroupEvent) {
        self.group_events.lock().unwrap().push(event);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub running: i64,
    pub reference_requests: i64,
    pub referenced_files: i64,
    pub denied: i64,
}

/// Session notifier that keeps counter totals for assertions.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    counters: Arc<Mutex<Counters>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> Counters {
        *self.counters.lock().unwrap()
    }
}

#[async_trait]
impl SessionNotifier for RecordingNotifier {
    async fn increment_running_requests(&self, _session: &SessionInfo) {
        self.counters.lock().unwrap().running += 1;
    }

    async fn decrement_running_requests(&self, _session: &SessionInfo) {
        self.counters.lock().unwrap().running -= 1;
    }

    async fn increment_reference_requests(&self, _session: &SessionInfo) {
        self.counters.lock().unwrap().reference_requests += 1;
    }

    async fn increment_referenced_files(&self, _session: &SessionInfo) {
        self.counters.lock().unwrap().referenced_files += 1;
    }

    async fn increment_denied_requests(&self, _session: &SessionInfo) {
        self.counters.lock().unwrap().denied += 1;
    }
}
