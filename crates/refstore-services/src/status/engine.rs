//! Storage request status engine
//!
//! Status is always re-derived from current rows instead of counted in
//! memory, so a crash mid-sweep only delays promotion and never corrupts
//! state. There is no lock anywhere in this path.

use std::sync::Arc;
use uuid::Uuid;

use refstore_core::models::{FileStorageRequest, StorageRequestStatus};
use refstore_core::{AppError, EngineConfig};
use refstore_db::{DeletionStore, ReferenceStore, StorageRequestStore};

/// Snapshot of everything that can block a storage request for one
/// (storage, checksum) pair.
#[derive(Debug, Clone, Default)]
pub struct BlockingState {
    /// A pending/running deletion request exists for the corresponding
    /// file reference.
    pub active_deletion: bool,
    /// Statuses of the other non-terminal storage requests for the key.
    pub siblings: Vec<StorageRequestStatus>,
}

/// Statuses that block `current` from proceeding.
///
/// A freshly created request also treats Delayed siblings as blocking; a
/// request that is itself already Delayed does not, otherwise two delayed
/// siblings would hold each other back forever.
fn blocking_statuses(current: StorageRequestStatus) -> &'static [StorageRequestStatus] {
    match current {
        StorageRequestStatus::Delayed => {
            &[StorageRequestStatus::Running, StorageRequestStatus::Pending]
        }
        _ => &[
            StorageRequestStatus::Running,
            StorageRequestStatus::Pending,
            StorageRequestStatus::Delayed,
        ],
    }
}

/// Side-effect-free status recomputation.
///
/// Returns Delayed when anything in `state` blocks the request, otherwise
/// `default_status` (ToHandle when not given).
pub fn new_status(
    current: StorageRequestStatus,
    default_status: Option<StorageRequestStatus>,
    state: &BlockingState,
) -> StorageRequestStatus {
    let blocking = blocking_statuses(current);
    let blocked =
        state.active_deletion || state.siblings.iter().any(|s| blocking.contains(s));

    if blocked {
        StorageRequestStatus::Delayed
    } else {
        default_status.unwrap_or(StorageRequestStatus::ToHandle)
    }
}

/// Repository-backed wrapper around [`new_status`], plus the periodic
/// promotion sweep.
#[derive(Clone)]
pub struct StatusEngine {
    references: Arc<dyn ReferenceStore>,
    deletions: Arc<dyn DeletionStore>,
    storage_requests: Arc<dyn StorageRequestStore>,
    config: EngineConfig,
}

impl StatusEngine {
    pub fn new(
        references: Arc<dyn ReferenceStore>,
        deletions: Arc<dyn DeletionStore>,
        storage_requests: Arc<dyn StorageRequestStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            references,
            deletions,
            storage_requests,
            config,
        }
    }

    /// Gather the blocking snapshot for one natural key, excluding the
    /// request under evaluation from its own siblings.
    async fn blocking_state(
        &self,
        storage: &str,
        checksum: &str,
        exclude: Option<Uuid>,
    ) -> Result<BlockingState, AppError> {
        let active_deletion = match self.references.search(storage, checksum).await? {
            Some(reference) => self
                .deletions
                .search(reference.id)
                .await?
                .map(|d| d.status.is_active())
                .unwrap_or(false),
            None => false,
        };

        let siblings = self
            .storage_requests
            .find_active_for_key(storage, checksum)
            .await?
            .into_iter()
            .filter(|r| Some(r.id) != exclude)
            .map(|r| r.status)
            .collect();

        Ok(BlockingState {
            active_deletion,
            siblings,
        })
    }

    /// Status for a not-yet-persisted request (the ToHandle path).
    pub async fn initial_status(
        &self,
        storage: &str,
        checksum: &str,
    ) -> Result<StorageRequestStatus, AppError> {
        let state = self.blocking_state(storage, checksum, None).await?;
        Ok(new_status(StorageRequestStatus::ToHandle, None, &state))
    }

    /// Recompute the status of a persisted request against current rows.
    pub async fn evaluate(
        &self,
        request: &FileStorageRequest,
        default_status: Option<StorageRequestStatus>,
    ) -> Result<StorageRequestStatus, AppError> {
        let state = self
            .blocking_state(&request.storage, &request.checksum, Some(request.id))
            .await?;
        Ok(new_status(request.status, default_status, &state))
    }

    /// Promotion sweep: load one page of delayed requests, promote the ones
    /// whose blockers have cleared, leave the rest untouched.
    ///
    /// Idempotent and safe to run concurrently with ingestion; every pass
    /// re-reads the blocking rows.
    #[tracing::instrument(skip(self))]
    pub async fn check_delayed_storage_requests(&self) -> Result<usize, AppError> {
        let page = self
            .storage_requests
            .list_delayed(self.config.delayed_page_size)
            .await?;
        let total = page.len();

        let mut promoted = 0;
        for request in page {
            let status = self.evaluate(&request, None).await?;
            if status == StorageRequestStatus::ToHandle {
                self.storage_requests
                    .set_status(request.id, status, None)
                    .await?;
                promoted += 1;
            }
        }

        if total > 0 {
            tracing::info!(total, promoted, "Delayed storage request sweep completed");
        }
        Ok(promoted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unblocked_defaults_to_to_handle() {
        let state = BlockingState::default();
        assert_eq!(
            new_status(StorageRequestStatus::ToHandle, None, &state),
            StorageRequestStatus::ToHandle
        );
        assert_eq!(
            new_status(
                StorageRequestStatus::ToHandle,
                Some(StorageRequestStatus::Pending),
                &state
            ),
            StorageRequestStatus::Pending
        );
    }

    #[test]
    fn test_active_deletion_delays() {
        let state = BlockingState {
            active_deletion: true,
            siblings: Vec::new(),
        };
        assert_eq!(
            new_status(StorageRequestStatus::ToHandle, None, &state),
            StorageRequestStatus::Delayed
        );
        assert_eq!(
            new_status(StorageRequestStatus::Delayed, None, &state),
            StorageRequestStatus::Delayed
        );
    }

    #[test]
    fn test_fresh_request_blocked_by_delayed_sibling() {
        let state = BlockingState {
            active_deletion: false,
            siblings: vec![StorageRequestStatus::Delayed],
        };
        assert_eq!(
            new_status(StorageRequestStatus::ToHandle, None, &state),
            StorageRequestStatus::Delayed
        );
    }

    #[test]
    fn test_delayed_request_graduates_past_delayed_siblings() {
        // The narrowed blocking set lets a delayed request promote once only
        // other delayed siblings remain.
        let state = BlockingState {
            active_deletion: false,
            siblings: vec![StorageRequestStatus::Delayed, StorageRequestStatus::Delayed],
        };
        assert_eq!(
            new_status(StorageRequestStatus::Delayed, None, &state),
            StorageRequestStatus::ToHandle
        );
    }

    #[test]
    fn test_delayed_request_still_blocked_by_running_sibling() {
        let state = BlockingState {
            active_deletion: false,
            siblings: vec![StorageRequestStatus::Running],
        };
        assert_eq!(
            new_status(StorageRequestStatus::Delayed, None, &state),
            StorageRequestStatus::Delayed
        );

        let state = BlockingState {
            active_deletion: false,
            siblings: vec![StorageRequestStatus::Pending],
        };
        assert_eq!(
            new_status(StorageRequestStatus::Delayed, None, &state),
            StorageRequestStatus::Delayed
        );
    }
}
