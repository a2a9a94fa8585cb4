//! Reference/storage request orchestrator
//!
//! Resolves one incoming batch at a time: bulk lookups up front (one query
//! per concern, never per item), then per-item conflict resolution. Item
//! failures are recorded against the group and never abort the batch; each
//! item's mutation is transactionally isolated in the repository layer, so
//! sibling items survive an item that dies mid-write.

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use refstore_core::events::FileReferenceEvent;
use refstore_core::models::{
    CopyItem, DeleteItem, DeletionRequestStatus, FileDeletionRequest, FileMetaInfo, FileReference,
    FileStorageRequest, ItemDisposition, ItemOutcome, NewStorageRequest, ReferenceItem,
    RequestType, SessionInfo, StorageItem, StorageRequestStatus,
};
use refstore_core::validation::{
    validate_copy_item, validate_delete_item, validate_group_id, validate_reference_item,
    validate_storage_item,
};
use refstore_core::{AppError, EventPublisher, SessionNotifier};
use refstore_db::{DeletionStore, ReferenceStore, StorageRequestStore};
use refstore_storage::{PluginRegistry, StoredLocation};

use crate::group::GroupTracker;
use crate::status::StatusEngine;

/// Key of the batch-local dedup maps: (storage, checksum) or (storage, url).
type BatchKey = (String, String);

/// How one delete item resolved.
enum DeleteResolution {
    /// Other owners remain; the reference stays.
    OwnerRemoved(FileReference),
    /// Last owner removed, storage has a plugin: a deletion request was
    /// created and the group result will be recorded at its completion.
    DeletionScheduled(FileReference),
    /// Last owner removed on an unmanaged storage: the row was purged
    /// directly, there is nothing physical to delete.
    Purged,
}

#[derive(Clone)]
pub struct RequestOrchestrator {
    references: Arc<dyn ReferenceStore>,
    deletions: Arc<dyn DeletionStore>,
    storage_requests: Arc<dyn StorageRequestStore>,
    status_engine: StatusEngine,
    groups: GroupTracker,
    registry: Arc<PluginRegistry>,
    notifier: Arc<dyn SessionNotifier>,
    publisher: Arc<dyn EventPublisher>,
}

impl RequestOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        references: Arc<dyn ReferenceStore>,
        deletions: Arc<dyn DeletionStore>,
        storage_requests: Arc<dyn StorageRequestStore>,
        status_engine: StatusEngine,
        groups: GroupTracker,
        registry: Arc<PluginRegistry>,
        notifier: Arc<dyn SessionNotifier>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            references,
            deletions,
            storage_requests,
            status_engine,
            groups,
            registry,
            notifier,
            publisher,
        }
    }

    /// Validate the batch envelope and grant the group. A structurally
    /// invalid envelope denies the whole group before any item runs; a
    /// duplicate group id is a caller bug and rejects the submission.
    async fn open_group(
        &self,
        group_id: &str,
        request_type: RequestType,
        count: usize,
    ) -> Result<(), AppError> {
        if let Err(e) = validate_group_id(group_id) {
            self.groups.denied(group_id, request_type, &e.to_string()).await;
            return Err(e);
        }
        if count == 0 {
            let cause = "batch contains no items".to_string();
            self.groups.denied(group_id, request_type, &cause).await;
            return Err(AppError::InvalidInput(cause));
        }
        self.groups
            .granted(group_id, request_type, count as i64, false)
            .await?;
        Ok(())
    }

    /// Record an item failure: result row, error event, denied counter.
    /// Recording failures are logged, not propagated, so siblings continue.
    async fn record_item_error(
        &self,
        group_id: &str,
        storage: &str,
        checksum: &str,
        owners: Vec<String>,
        cause: &str,
        session: &SessionInfo,
    ) {
        if let Err(e) = self
            .groups
            .request_error(group_id, checksum, storage, owners, cause)
            .await
        {
            tracing::error!(error = %e, group_id = %group_id, "Failed to record item error");
        }
        self.publisher
            .publish_file_event(FileReferenceEvent::error(
                Some(group_id.to_string()),
                storage,
                checksum,
                cause.to_string(),
            ))
            .await;
        self.notifier.increment_denied_requests(session).await;
    }

    // =========================================================================
    // REFERENCE PATH
    // =========================================================================

    /// Process one bulk reference batch.
    #[tracing::instrument(skip(self, items, session), fields(group_id = %group_id, count = items.len()))]
    pub async fn reference(
        &self,
        group_id: &str,
        items: Vec<ReferenceItem>,
        session: &SessionInfo,
    ) -> Result<Vec<ItemOutcome>, AppError> {
        self.open_group(group_id, RequestType::Reference, items.len())
            .await?;
        self.notifier.increment_reference_requests(session).await;

        // One query per concern for the whole batch.
        let checksums: Vec<String> = items.iter().map(|i| i.meta.checksum.clone()).collect();
        let urls: Vec<String> = items.iter().filter_map(|i| i.url.clone()).collect();

        let mut refs_by_key: HashMap<BatchKey, FileReference> = self
            .references
            .search_by_checksums(&checksums)
            .await?
            .into_iter()
            .map(|r| ((r.storage.clone(), r.checksum.clone()), r))
            .collect();

        let mut refs_by_url: HashMap<BatchKey, FileReference> = self
            .references
            .search_by_urls(&urls)
            .await?
            .into_iter()
            .filter_map(|r| {
                r.origin_url
                    .clone()
                    .map(|url| ((r.storage.clone(), url), r))
            })
            .collect();

        let reference_ids: Vec<Uuid> = refs_by_key.values().map(|r| r.id).collect();
        let mut deletions_by_ref: HashMap<Uuid, FileDeletionRequest> = self
            .deletions
            .search_by_reference_ids(&reference_ids)
            .await?
            .into_iter()
            .map(|d| (d.file_reference_id, d))
            .collect();

        let mut outcomes = Vec::with_capacity(items.len());
        for item in &items {
            self.notifier.increment_running_requests(session).await;

            let outcome = match self
                .resolve_reference_item(item, &mut refs_by_key, &mut refs_by_url, &mut deletions_by_ref)
                .await
            {
                Ok((disposition, reference)) => {
                    if let Err(e) = self
                        .groups
                        .request_success(
                            group_id,
                            &item.meta.checksum,
                            &item.storage,
                            None,
                            vec![item.owner.clone()],
                            Some(reference.id),
                        )
                        .await
                    {
                        tracing::error!(error = %e, group_id = %group_id, "Failed to record item success");
                    }
                    self.publisher
                        .publish_file_event(FileReferenceEvent::stored(
                            Some(group_id.to_string()),
                            &item.storage,
                            &item.meta.checksum,
                            reference.id,
                        ))
                        .await;
                    if matches!(
                        disposition,
                        ItemDisposition::Created | ItemDisposition::Updated
                    ) {
                        self.notifier.increment_referenced_files(session).await;
                    }
                    ItemOutcome::Ok {
                        storage: item.storage.clone(),
                        checksum: item.meta.checksum.clone(),
                        disposition,
                        reference: Some(reference),
                    }
                }
                Err(e) => {
                    let cause = e.to_string();
                    tracing::warn!(
                        group_id = %group_id,
                        storage = %item.storage,
                        checksum = %item.meta.checksum,
                        cause = %cause,
                        "Reference item denied"
                    );
                    self.record_item_error(
                        group_id,
                        &item.storage,
                        &item.meta.checksum,
                        vec![item.owner.clone()],
                        &cause,
                        session,
                    )
                    .await;
                    ItemOutcome::Err {
                        storage: item.storage.clone(),
                        checksum: item.meta.checksum.clone(),
                        cause,
                    }
                }
            };

            self.notifier.decrement_running_requests(session).await;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Resolve one reference item against the batch-local view of existing
    /// rows. Created references join the maps so duplicates within the same
    /// batch resolve to Updated/Unmodified instead of racing to create.
    async fn resolve_reference_item(
        &self,
        item: &ReferenceItem,
        refs_by_key: &mut HashMap<BatchKey, FileReference>,
        refs_by_url: &mut HashMap<BatchKey, FileReference>,
        deletions_by_ref: &mut HashMap<Uuid, FileDeletionRequest>,
    ) -> Result<(ItemDisposition, FileReference), AppError> {
        validate_reference_item(item)?;

        // Two distinct payloads must never silently alias one URL.
        if let Some(url) = &item.url {
            if let Some(other) = refs_by_url.get(&(item.storage.clone(), url.clone())) {
                if other.checksum != item.meta.checksum {
                    return Err(AppError::ChecksumMismatch {
                        url: url.clone(),
                        storage: item.storage.clone(),
                    });
                }
            }
        }

        let key = (item.storage.clone(), item.meta.checksum.clone());

        if let Some(existing) = refs_by_key.get(&key).cloned() {
            let deletion = deletions_by_ref.get(&existing.id).cloned();
            if let Some(deletion) = &deletion {
                if deletion.status.is_active() {
                    return Err(AppError::FileBeingDeleted {
                        storage: item.storage.clone(),
                        checksum: item.meta.checksum.clone(),
                    });
                }
            }

            // A settled deletion request is superseded by the re-reference;
            // cancellation and owner attach happen in one transaction.
            let cancel = deletion.map(|d| d.id);
            let changed = self.references.adopt(existing.id, &item.owner, cancel).await?;
            if cancel.is_some() {
                deletions_by_ref.remove(&existing.id);
            }

            let mut reference = existing;
            if changed {
                reference.owners.push(item.owner.clone());
                refs_by_key.insert(key, reference.clone());
                Ok((ItemDisposition::Updated, reference))
            } else {
                Ok((ItemDisposition::Unmodified, reference))
            }
        } else {
            let reference = self
                .references
                .create(
                    vec![item.owner.clone()],
                    &item.meta,
                    &item.storage,
                    item.url.clone(),
                    true,
                )
                .await?;
            refs_by_key.insert(key, reference.clone());
            if let Some(url) = &reference.origin_url {
                refs_by_url.insert((reference.storage.clone(), url.clone()), reference.clone());
            }
            Ok((ItemDisposition::Created, reference))
        }
    }

    // =========================================================================
    // STORE PATH
    // =========================================================================

    /// Process one bulk store batch. Items are accepted into the storage
    /// request queue; their group results arrive at completion.
    #[tracing::instrument(skip(self, items, session), fields(group_id = %group_id, count = items.len()))]
    pub async fn store(
        &self,
        group_id: &str,
        items: Vec<StorageItem>,
        session: &SessionInfo,
    ) -> Result<Vec<ItemOutcome>, AppError> {
        self.open_group(group_id, RequestType::Store, items.len())
            .await?;

        let mut outcomes = Vec::with_capacity(items.len());
        for item in &items {
            self.notifier.increment_running_requests(session).await;

            let outcome = match self.submit_storage_item(group_id, item, session).await {
                Ok(request) => {
                    tracing::debug!(
                        request_id = %request.id,
                        status = %request.status,
                        "Storage request accepted"
                    );
                    ItemOutcome::Ok {
                        storage: item.storage.clone(),
                        checksum: item.meta.checksum.clone(),
                        disposition: ItemDisposition::Accepted,
                        reference: None,
                    }
                }
                Err(e) => {
                    let cause = e.to_string();
                    self.record_item_error(
                        group_id,
                        &item.storage,
                        &item.meta.checksum,
                        item.owners.clone(),
                        &cause,
                        session,
                    )
                    .await;
                    ItemOutcome::Err {
                        storage: item.storage.clone(),
                        checksum: item.meta.checksum.clone(),
                        cause,
                    }
                }
            };

            self.notifier.decrement_running_requests(session).await;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Merge a redelivered duplicate into the existing aggregation of the
    /// same group, or create a new request whose initial status the engine
    /// derives from current blocking rows.
    async fn submit_storage_item(
        &self,
        group_id: &str,
        item: &StorageItem,
        session: &SessionInfo,
    ) -> Result<FileStorageRequest, AppError> {
        validate_storage_item(item)?;

        let active = self
            .storage_requests
            .find_active_for_key(&item.storage, &item.meta.checksum)
            .await?;
        if let Some(existing) = active.iter().find(|r| r.group_id == group_id) {
            return self
                .storage_requests
                .merge_owners(existing.id, &item.owners)
                .await;
        }

        let status = self
            .status_engine
            .initial_status(&item.storage, &item.meta.checksum)
            .await?;

        self.storage_requests
            .create(NewStorageRequest {
                owners: item.owners.clone(),
                checksum: item.meta.checksum.clone(),
                checksum_algorithm: item.meta.checksum_algorithm.clone(),
                file_name: item.meta.file_name.clone(),
                size: item.meta.size,
                mime_type: item.meta.mime_type.clone(),
                origin_url: item.origin_url.clone(),
                storage: item.storage.clone(),
                store_path: item.store_path.clone(),
                group_id: group_id.to_string(),
                session_owner: session.session_owner.clone(),
                session: session.session.clone(),
                status,
            })
            .await
    }

    // =========================================================================
    // DELETE PATH
    // =========================================================================

    /// Process one bulk delete batch: remove the owner per item, schedule a
    /// physical deletion once the last owner is gone.
    #[tracing::instrument(skip(self, items, session), fields(group_id = %group_id, count = items.len()))]
    pub async fn delete(
        &self,
        group_id: &str,
        items: Vec<DeleteItem>,
        session: &SessionInfo,
    ) -> Result<Vec<ItemOutcome>, AppError> {
        self.open_group(group_id, RequestType::Delete, items.len())
            .await?;

        let checksums: Vec<String> = items.iter().map(|i| i.checksum.clone()).collect();
        let mut refs_by_key: HashMap<BatchKey, FileReference> = self
            .references
            .search_by_checksums(&checksums)
            .await?
            .into_iter()
            .map(|r| ((r.storage.clone(), r.checksum.clone()), r))
            .collect();

        let mut outcomes = Vec::with_capacity(items.len());
        for item in &items {
            self.notifier.increment_running_requests(session).await;

            let outcome = match self
                .resolve_delete_item(group_id, item, &mut refs_by_key)
                .await
            {
                Ok(resolution) => {
                    let reference = match resolution {
                        DeleteResolution::OwnerRemoved(reference) => {
                            if let Err(e) = self
                                .groups
                                .request_success(
                                    group_id,
                                    &item.checksum,
                                    &item.storage,
                                    None,
                                    vec![item.owner.clone()],
                                    Some(reference.id),
                                )
                                .await
                            {
                                tracing::error!(error = %e, group_id = %group_id, "Failed to record item success");
                            }
                            Some(reference)
                        }
                        DeleteResolution::DeletionScheduled(reference) => Some(reference),
                        DeleteResolution::Purged => {
                            if let Err(e) = self
                                .groups
                                .request_success(
                                    group_id,
                                    &item.checksum,
                                    &item.storage,
                                    None,
                                    vec![item.owner.clone()],
                                    None,
                                )
                                .await
                            {
                                tracing::error!(error = %e, group_id = %group_id, "Failed to record item success");
                            }
                            self.publisher
                                .publish_file_event(FileReferenceEvent::deleted(
                                    Some(group_id.to_string()),
                                    &item.storage,
                                    &item.checksum,
                                ))
                                .await;
                            None
                        }
                    };
                    ItemOutcome::Ok {
                        storage: item.storage.clone(),
                        checksum: item.checksum.clone(),
                        disposition: ItemDisposition::Accepted,
                        reference,
                    }
                }
                Err(e) => {
                    let cause = e.to_string();
                    self.record_item_error(
                        group_id,
                        &item.storage,
                        &item.checksum,
                        vec![item.owner.clone()],
                        &cause,
                        session,
                    )
                    .await;
                    ItemOutcome::Err {
                        storage: item.storage.clone(),
                        checksum: item.checksum.clone(),
                        cause,
                    }
                }
            };

            self.notifier.decrement_running_requests(session).await;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn resolve_delete_item(
        &self,
        group_id: &str,
        item: &DeleteItem,
        refs_by_key: &mut HashMap<BatchKey, FileReference>,
    ) -> Result<DeleteResolution, AppError> {
        validate_delete_item(item)?;

        let key = (item.storage.clone(), item.checksum.clone());
        let existing = refs_by_key.get(&key).cloned().ok_or_else(|| {
            AppError::NotFound(format!(
                "no file reference for checksum {} at storage {}",
                item.checksum, item.storage
            ))
        })?;

        let updated = self
            .references
            .remove_owner(existing.id, &item.owner)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("file reference {} vanished", existing.id))
            })?;

        if !updated.is_deletion_candidate() {
            refs_by_key.insert(key, updated.clone());
            return Ok(DeleteResolution::OwnerRemoved(updated));
        }

        if self.registry.contains(&item.storage) {
            self.deletions
                .create(updated.id, false, Some(group_id))
                .await?;
            self.references.set_pending_action(updated.id, true).await?;
            refs_by_key.insert(key, updated.clone());
            Ok(DeleteResolution::DeletionScheduled(updated))
        } else {
            // Unmanaged storage: nothing physical to remove, purge the row.
            self.references.delete(updated.id).await?;
            self.groups.delete_request_info_for_file(updated.id).await?;
            refs_by_key.remove(&key);
            Ok(DeleteResolution::Purged)
        }
    }

    // =========================================================================
    // COPY PATH
    // =========================================================================

    /// Process one bulk copy batch: each item funnels the source reference's
    /// meta info into a storage request for the destination storage.
    #[tracing::instrument(skip(self, items, session), fields(group_id = %group_id, count = items.len()))]
    pub async fn copy(
        &self,
        group_id: &str,
        items: Vec<CopyItem>,
        session: &SessionInfo,
    ) -> Result<Vec<ItemOutcome>, AppError> {
        self.open_group(group_id, RequestType::Copy, items.len())
            .await?;

        let mut outcomes = Vec::with_capacity(items.len());
        for item in &items {
            self.notifier.increment_running_requests(session).await;

            let outcome = match self.submit_copy_item(group_id, item, session).await {
                Ok(_request) => ItemOutcome::Ok {
                    storage: item.destination_storage.clone(),
                    checksum: item.checksum.clone(),
                    disposition: ItemDisposition::Accepted,
                    reference: None,
                },
                Err(e) => {
                    let cause = e.to_string();
                    self.record_item_error(
                        group_id,
                        &item.destination_storage,
                        &item.checksum,
                        item.owners.clone(),
                        &cause,
                        session,
                    )
                    .await;
                    ItemOutcome::Err {
                        storage: item.destination_storage.clone(),
                        checksum: item.checksum.clone(),
                        cause,
                    }
                }
            };

            self.notifier.decrement_running_requests(session).await;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn submit_copy_item(
        &self,
        group_id: &str,
        item: &CopyItem,
        session: &SessionInfo,
    ) -> Result<FileStorageRequest, AppError> {
        validate_copy_item(item)?;

        let source = self
            .references
            .search(&item.source_storage, &item.checksum)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no file reference for checksum {} at storage {}",
                    item.checksum, item.source_storage
                ))
            })?;

        let storage_item = StorageItem {
            owners: item.owners.clone(),
            storage: item.destination_storage.clone(),
            store_path: item.store_path.clone(),
            origin_url: source.origin_url.clone(),
            meta: FileMetaInfo {
                checksum: source.checksum.clone(),
                checksum_algorithm: source.checksum_algorithm.clone(),
                file_name: source.file_name.clone(),
                size: source.size,
                mime_type: source.mime_type.clone(),
                width: source.width,
                height: source.height,
                kind: source.kind.clone(),
            },
        };

        self.submit_storage_item(group_id, &storage_item, session).await
    }

    // =========================================================================
    // COMPLETION HOOKS (driven by the storage plugin executors)
    // =========================================================================

    /// Mark a claimed storage request as running.
    pub async fn start_storage_request(&self, id: Uuid) -> Result<(), AppError> {
        self.storage_requests
            .set_status(id, StorageRequestStatus::Running, None)
            .await
    }

    /// Finish a storage request: on success the stored artifact becomes (or
    /// merges into) the canonical file reference for its natural key.
    #[tracing::instrument(skip(self, outcome), fields(request_id = %id))]
    pub async fn complete_storage_request(
        &self,
        id: Uuid,
        outcome: Result<StoredLocation, String>,
    ) -> Result<(), AppError> {
        let request = self
            .storage_requests
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("storage request {}", id)))?;
        let session = SessionInfo {
            session_owner: request.session_owner.clone(),
            session: request.session.clone(),
        };

        match outcome {
            Ok(location) => {
                self.storage_requests
                    .set_status(id, StorageRequestStatus::Done, None)
                    .await?;

                let reference = match self
                    .references
                    .search(&request.storage, &request.checksum)
                    .await?
                {
                    Some(existing) => {
                        for owner in &request.owners {
                            self.references.add_owner(existing.id, owner).await?;
                        }
                        self.references.get(existing.id).await?.ok_or_else(|| {
                            AppError::Internal(format!("file reference {} vanished", existing.id))
                        })?
                    }
                    None => {
                        let meta = FileMetaInfo {
                            checksum: request.checksum.clone(),
                            checksum_algorithm: request.checksum_algorithm.clone(),
                            file_name: request.file_name.clone(),
                            size: request.size,
                            mime_type: request.mime_type.clone(),
                            width: None,
                            height: None,
                            kind: None,
                        };
                        self.references
                            .create(
                                request.owners.clone(),
                                &meta,
                                &request.storage,
                                request.origin_url.clone(),
                                false,
                            )
                            .await?
                    }
                };

                self.groups
                    .request_success(
                        &request.group_id,
                        &request.checksum,
                        &request.storage,
                        Some(location.key.clone()),
                        request.owners.clone(),
                        Some(reference.id),
                    )
                    .await?;
                self.publisher
                    .publish_file_event(FileReferenceEvent::stored(
                        Some(request.group_id.clone()),
                        &request.storage,
                        &request.checksum,
                        reference.id,
                    ))
                    .await;
                self.notifier.increment_referenced_files(&session).await;
                Ok(())
            }
            Err(cause) => {
                self.storage_requests
                    .set_status(id, StorageRequestStatus::Error, Some(&cause))
                    .await?;
                self.groups
                    .request_error(
                        &request.group_id,
                        &request.checksum,
                        &request.storage,
                        request.owners.clone(),
                        &cause,
                    )
                    .await?;
                self.publisher
                    .publish_file_event(FileReferenceEvent::error(
                        Some(request.group_id.clone()),
                        &request.storage,
                        &request.checksum,
                        cause,
                    ))
                    .await;
                self.notifier.increment_denied_requests(&session).await;
                Ok(())
            }
        }
    }

    /// Mark a dispatched deletion request as running.
    pub async fn start_deletion_request(&self, id: Uuid) -> Result<(), AppError> {
        self.deletions
            .set_status(id, DeletionRequestStatus::Running)
            .await
    }

    /// Finish a deletion request. On success (or on failure with the force
    /// flag set) the owning file reference is removed and its result rows
    /// cleaned up; otherwise the request stays visible in Error state.
    #[tracing::instrument(skip(self, outcome), fields(request_id = %id))]
    pub async fn complete_deletion_request(
        &self,
        id: Uuid,
        outcome: Result<(), String>,
    ) -> Result<(), AppError> {
        let deletion = self
            .deletions
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("deletion request {}", id)))?;
        let reference = self
            .references
            .get(deletion.file_reference_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "deletion request {} targets missing reference {}",
                    id, deletion.file_reference_id
                ))
            })?;

        match outcome {
            Ok(()) => self.finish_deletion(&deletion, &reference).await,
            Err(cause) if deletion.force => {
                tracing::warn!(
                    request_id = %id,
                    cause = %cause,
                    "Forced deletion: removing reference despite storage error"
                );
                self.finish_deletion(&deletion, &reference).await
            }
            Err(cause) => {
                self.deletions
                    .set_status(id, DeletionRequestStatus::Error)
                    .await?;
                if let Some(group_id) = &deletion.group_id {
                    self.groups
                        .request_error(
                            group_id,
                            &reference.checksum,
                            &reference.storage,
                            Vec::new(),
                            &cause,
                        )
                        .await?;
                }
                self.publisher
                    .publish_file_event(FileReferenceEvent::error(
                        deletion.group_id.clone(),
                        &reference.storage,
                        &reference.checksum,
                        cause,
                    ))
                    .await;
                Ok(())
            }
        }
    }

    async fn finish_deletion(
        &self,
        deletion: &FileDeletionRequest,
        reference: &FileReference,
    ) -> Result<(), AppError> {
        self.references.delete(reference.id).await?;
        // Explicit for store implementations without cascading deletes.
        self.deletions.delete(deletion.id).await?;
        self.groups.delete_request_info_for_file(reference.id).await?;

        if let Some(group_id) = &deletion.group_id {
            self.groups
                .request_success(
                    group_id,
                    &reference.checksum,
                    &reference.storage,
                    None,
                    Vec::new(),
                    None,
                )
                .await?;
        }
        self.publisher
            .publish_file_event(FileReferenceEvent::deleted(
                deletion.group_id.clone(),
                &reference.storage,
                &reference.checksum,
            ))
            .await;
        Ok(())
    }
}
