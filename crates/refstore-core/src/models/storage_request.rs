//! Storage request aggregation: an intent to physically store a new file at
//! a destination storage, merged across duplicate submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle of a storage request.
///
/// `ToHandle -> Delayed -> ToHandle -> Pending -> Running -> {Done, Error}`.
/// `Delayed` is re-entrant: a request may cycle back through it whenever a
/// new conflict appears before it is picked up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StorageRequestStatus {
    ToHandle,
    Delayed,
    Pending,
    Running,
    Done,
    Error,
}

impl StorageRequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StorageRequestStatus::Done | StorageRequestStatus::Error)
    }
}

impl Display for StorageRequestStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageRequestStatus::ToHandle => write!(f, "to_handle"),
            StorageRequestStatus::Delayed => write!(f, "delayed"),
            StorageRequestStatus::Pending => write!(f, "pending"),
            StorageRequestStatus::Running => write!(f, "running"),
            StorageRequestStatus::Done => write!(f, "done"),
            StorageRequestStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for StorageRequestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to_handle" => Ok(StorageRequestStatus::ToHandle),
            "delayed" => Ok(StorageRequestStatus::Delayed),
            "pending" => Ok(StorageRequestStatus::Pending),
            "running" => Ok(StorageRequestStatus::Running),
            "done" => Ok(StorageRequestStatus::Done),
            "error" => Ok(StorageRequestStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid storage request status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FileStorageRequest {
    pub id: Uuid,
    pub owners: Vec<String>,
    pub checksum: String,
    pub checksum_algorithm: String,
    pub file_name: String,
    pub size: i64,
    pub mime_type: String,
    pub origin_url: Option<String>,
    /// Destination storage backend identifier.
    pub storage: String,
    /// Optional sub-directory below the backend root.
    pub store_path: Option<String>,
    pub group_id: String,
    pub session_owner: Option<String>,
    pub session: Option<String>,
    pub status: StorageRequestStatus,
    pub error_cause: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileStorageRequest {
    pub fn natural_key(&self) -> (&str, &str) {
        (self.storage.as_str(), self.checksum.as_str())
    }
}

/// Insert payload for a new storage request; the repository assigns id,
/// timestamps and clears the error cause.
#[derive(Debug, Clone)]
pub struct NewStorageRequest {
    pub owners: Vec<String>,
    pub checksum: String,
    pub checksum_algorithm: String,
    pub file_name: String,
    pub size: i64,
    pub mime_type: String,
    pub origin_url: Option<String>,
    pub storage: String,
    pub store_path: Option<String>,
    pub group_id: String,
    pub session_owner: Option<String>,
    pub session: Option<String>,
    pub status: StorageRequestStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(StorageRequestStatus::Done.is_terminal());
        assert!(StorageRequestStatus::Error.is_terminal());
        assert!(!StorageRequestStatus::ToHandle.is_terminal());
        assert!(!StorageRequestStatus::Delayed.is_terminal());
        assert!(!StorageRequestStatus::Pending.is_terminal());
        assert!(!StorageRequestStatus::Running.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for s in [
            StorageRequestStatus::ToHandle,
            StorageRequestStatus::Delayed,
            StorageRequestStatus::Pending,
            StorageRequestStatus::Running,
            StorageRequestStatus::Done,
            StorageRequestStatus::Error,
        ] {
            assert_eq!(s.to_string().parse::<StorageRequestStatus>().unwrap(), s);
        }
    }
}
