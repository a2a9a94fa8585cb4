//! Incoming request items and per-item outcomes.
//!
//! Batches arrive from the message bus as `{files: [...], group_id}`; the
//! orchestrator processes the items of one batch in arrival order and
//! returns one outcome per item.

use serde::{Deserialize, Serialize};

use super::reference::{FileMetaInfo, FileReference};

/// Session identification forwarded to the monitoring notifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_owner: Option<String>,
    pub session: Option<String>,
}

/// One file of a bulk reference batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub owner: String,
    pub storage: String,
    pub url: Option<String>,
    pub meta: FileMetaInfo,
}

/// One file of a bulk store batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageItem {
    pub owners: Vec<String>,
    pub storage: String,
    pub store_path: Option<String>,
    pub origin_url: Option<String>,
    pub meta: FileMetaInfo,
}

/// One file of a bulk delete batch: remove `owner` from the reference
/// identified by (storage, checksum).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteItem {
    pub owner: String,
    pub storage: String,
    pub checksum: String,
}

/// One file of a bulk copy batch: re-store the artifact identified by
/// (source_storage, checksum) at a destination storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyItem {
    pub owners: Vec<String>,
    pub source_storage: String,
    pub checksum: String,
    pub destination_storage: String,
    pub store_path: Option<String>,
}

/// How an item resolved against the existing reference set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemDisposition {
    /// No reference existed for the natural key; a new one was created.
    Created,
    /// The reference existed and the requesting owner was added.
    Updated,
    /// The reference existed and already carried the requesting owner.
    Unmodified,
    /// The request was accepted but queued for asynchronous handling
    /// (store/copy submissions, delete intents).
    Accepted,
}

/// Per-item outcome of a batch. Item failures never abort the batch; an
/// `Err` outcome carries the cause that was also recorded against the group.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    Ok {
        storage: String,
        checksum: String,
        disposition: ItemDisposition,
        reference: Option<FileReference>,
    },
    Err {
        storage: String,
        checksum: String,
        cause: String,
    },
}

impl ItemOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ItemOutcome::Ok { .. })
    }

    pub fn disposition(&self) -> Option<ItemDisposition> {
        match self {
            ItemOutcome::Ok { disposition, .. } => Some(*disposition),
            ItemOutcome::Err { .. } => None,
        }
    }

    pub fn reference(&self) -> Option<&FileReference> {
        match self {
            ItemOutcome::Ok { reference, .. } => reference.as_ref(),
            ItemOutcome::Err { .. } => None,
        }
    }
}
