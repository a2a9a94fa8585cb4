//! Event payloads published to the message bus.
//!
//! Downstream consumers learn outcomes exclusively through these events;
//! there is no interactive user at this layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{RequestResultInfo, RequestType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEventKind {
    Stored,
    Deleted,
    Error,
}

/// Per-file outcome event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReferenceEvent {
    pub kind: FileEventKind,
    pub group_id: Option<String>,
    pub storage: String,
    pub checksum: String,
    pub file_reference_id: Option<Uuid>,
    pub cause: Option<String>,
}

impl FileReferenceEvent {
    pub fn stored(group_id: Option<String>, storage: &str, checksum: &str, id: Uuid) -> Self {
        Self {
            kind: FileEventKind::Stored,
            group_id,
            storage: storage.to_string(),
            checksum: checksum.to_string(),
            file_reference_id: Some(id),
            cause: None,
        }
    }

    pub fn deleted(group_id: Option<String>, storage: &str, checksum: &str) -> Self {
        Self {
            kind: FileEventKind::Deleted,
            group_id,
            storage: storage.to_string(),
            checksum: checksum.to_string(),
            file_reference_id: None,
            cause: None,
        }
    }

    pub fn error(group_id: Option<String>, storage: &str, checksum: &str, cause: String) -> Self {
        Self {
            kind: FileEventKind::Error,
            group_id,
            storage: storage.to_string(),
            checksum: checksum.to_string(),
            file_reference_id: None,
            cause: Some(cause),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupEventKind {
    Granted,
    Denied,
    Success,
    Error,
}

/// Group lifecycle event. Terminal events carry the recorded per-item
/// results, chunked so a single bus payload never exceeds the configured
/// maximum number of entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestsGroupEvent {
    pub kind: GroupEventKind,
    pub group_id: String,
    pub request_type: RequestType,
    pub cause: Option<String>,
    pub results: Vec<RequestResultInfo>,
}

impl RequestsGroupEvent {
    pub fn granted(group_id: &str, request_type: RequestType) -> Self {
        Self {
            kind: GroupEventKind::Granted,
            group_id: group_id.to_string(),
            request_type,
            cause: None,
            results: Vec::new(),
        }
    }

    pub fn denied(group_id: &str, request_type: RequestType, cause: String) -> Self {
        Self {
            kind: GroupEventKind::Denied,
            group_id: group_id.to_string(),
            request_type,
            cause: Some(cause),
            results: Vec::new(),
        }
    }
}
