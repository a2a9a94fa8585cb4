//! Request group tracker
//!
//! Groups many individual requests under one externally visible correlation
//! id. Completion is never counted live: the expected count is stored once
//! at grant time and compared against persisted result rows during
//! reconciliation, which keeps the aggregation correct under at-least-once
//! delivery and restarts.

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use refstore_core::events::{GroupEventKind, RequestsGroupEvent};
use refstore_core::models::{GroupStatus, RequestGroup, RequestResultInfo, RequestType};
use refstore_core::{AppError, EngineConfig, EventPublisher};
use refstore_db::GroupStore;

#[derive(Clone, Debug)]
pub struct GroupTrackerConfig {
    /// Maximum result entries per outbound group event.
    pub max_results_per_event: usize,
    /// Expiration offset in days; zero or negative disables expiration.
    pub expiration_days: i64,
    /// Page size for one reconciliation run.
    pub check_page_size: i64,
}

impl Default for GroupTrackerConfig {
    fn default() -> Self {
        Self {
            max_results_per_event: 500,
            expiration_days: 5,
            check_page_size: 500,
        }
    }
}

impl From<&EngineConfig> for GroupTrackerConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_results_per_event: config.group_event_max_results,
            expiration_days: config.reference_expiration_days,
            check_page_size: config.delayed_page_size,
        }
    }
}

#[derive(Clone)]
pub struct GroupTracker {
    groups: Arc<dyn GroupStore>,
    publisher: Arc<dyn EventPublisher>,
    config: GroupTrackerConfig,
}

impl GroupTracker {
    pub fn new(
        groups: Arc<dyn GroupStore>,
        publisher: Arc<dyn EventPublisher>,
        config: GroupTrackerConfig,
    ) -> Self {
        Self {
            groups,
            publisher,
            config,
        }
    }

    /// Persist a new group and publish Granted, unless `silent` is set for
    /// internal-only callers.
    ///
    /// Fails with [`AppError::DuplicateGroupId`] when the id already exists;
    /// the duplicate call publishes nothing.
    #[tracing::instrument(skip(self), fields(group_id = %group_id, request_type = %request_type, count = count))]
    pub async fn granted(
        &self,
        group_id: &str,
        request_type: RequestType,
        count: i64,
        silent: bool,
    ) -> Result<RequestGroup, AppError> {
        let now = Utc::now();
        let expiration_date = if self.config.expiration_days > 0 {
            Some(now + Duration::days(self.config.expiration_days))
        } else {
            None
        };

        let group = RequestGroup {
            id: group_id.to_string(),
            request_type,
            expected_count: count,
            expiration_date,
            status: GroupStatus::Granted,
            created_at: now,
            updated_at: now,
        };

        self.groups.insert_granted(&group).await?;

        if !silent {
            self.publisher
                .publish_group_event(RequestsGroupEvent::granted(group_id, request_type))
                .await;
        }

        tracing::info!(group_id = %group_id, count, "Request group granted");
        Ok(group)
    }

    /// Publish a Denied event. No group row is persisted: from the caller's
    /// perspective a denied group never existed.
    #[tracing::instrument(skip(self), fields(group_id = %group_id, request_type = %request_type))]
    pub async fn denied(&self, group_id: &str, request_type: RequestType, cause: &str) {
        tracing::warn!(group_id = %group_id, cause = %cause, "Request group denied");
        self.publisher
            .publish_group_event(RequestsGroupEvent::denied(
                group_id,
                request_type,
                cause.to_string(),
            ))
            .await;
    }

    /// Append a success result for one item of a group.
    #[tracing::instrument(skip(self, owners), fields(group_id = %group_id, checksum = %checksum, storage = %storage))]
    pub async fn request_success(
        &self,
        group_id: &str,
        checksum: &str,
        storage: &str,
        store_path: Option<String>,
        owners: Vec<String>,
        file_reference_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        self.groups
            .append_result(&RequestResultInfo {
                id: Uuid::new_v4(),
                group_id: group_id.to_string(),
                checksum: checksum.to_string(),
                storage: storage.to_string(),
                store_path,
                owners,
                file_reference_id,
                error_cause: None,
                created_at: Utc::now(),
            })
            .await
    }

    /// Append an error result for one item of a group.
    #[tracing::instrument(skip(self, owners), fields(group_id = %group_id, checksum = %checksum, storage = %storage, cause = %cause))]
    pub async fn request_error(
        &self,
        group_id: &str,
        checksum: &str,
        storage: &str,
        owners: Vec<String>,
        cause: &str,
    ) -> Result<(), AppError> {
        self.groups
            .append_result(&RequestResultInfo {
                id: Uuid::new_v4(),
                group_id: group_id.to_string(),
                checksum: checksum.to_string(),
                storage: storage.to_string(),
                store_path: None,
                owners,
                file_reference_id: None,
                error_cause: Some(cause.to_string()),
                created_at: Utc::now(),
            })
            .await
    }

    /// Cleanup hook invoked when a file reference is purged, so no orphaned
    /// result rows keep pointing at it.
    pub async fn delete_request_info_for_file(&self, file_id: Uuid) -> Result<u64, AppError> {
        self.groups.delete_results_for_file(file_id).await
    }

    /// Reconciliation: close every granted group whose recorded results have
    /// reached the expected count, and expire groups past their deadline.
    /// Returns the number of groups closed.
    #[tracing::instrument(skip(self))]
    pub async fn check_request_groups(&self) -> Result<usize, AppError> {
        let open = self.groups.list_open(self.config.check_page_size).await?;
        let now = Utc::now();

        let mut closed = 0;
        for group in open {
            let (total, errors) = self.groups.count_results(&group.id).await?;

            if total >= group.expected_count {
                let status = if errors > 0 {
                    GroupStatus::Error
                } else {
                    GroupStatus::Success
                };
                self.close_group(&group, status, None).await?;
                closed += 1;
            } else if group.expiration_date.is_some_and(|deadline| deadline < now) {
                self.close_group(&group, GroupStatus::Error, Some("expired".to_string()))
                    .await?;
                closed += 1;
            }
        }

        if closed > 0 {
            tracing::info!(closed, "Request group reconciliation completed");
        }
        Ok(closed)
    }

    /// Mark the group terminal and publish its results, chunked so one bus
    /// payload never exceeds the configured maximum.
    async fn close_group(
        &self,
        group: &RequestGroup,
        status: GroupStatus,
        cause: Option<String>,
    ) -> Result<(), AppError> {
        self.groups.set_status(&group.id, status).await?;

        let kind = match status {
            GroupStatus::Success => GroupEventKind::Success,
            _ => GroupEventKind::Error,
        };

        let results = self.groups.list_results(&group.id).await?;
        if results.is_empty() {
            self.publisher
                .publish_group_event(RequestsGroupEvent {
                    kind,
                    group_id: group.id.clone(),
                    request_type: group.request_type,
                    cause: cause.clone(),
                    results: Vec::new(),
                })
                .await;
        } else {
            for chunk in results.chunks(self.config.max_results_per_event) {
                self.publisher
                    .publish_group_event(RequestsGroupEvent {
                        kind,
                        group_id: group.id.clone(),
                        request_type: group.request_type,
                        cause: cause.clone(),
                        results: chunk.to_vec(),
                    })
                    .await;
            }
        }

        tracing::info!(group_id = %group.id, status = %status, "Request group closed");
        Ok(())
    }
}
