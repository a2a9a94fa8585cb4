//! Deletion request model: an in-flight intent to physically remove a file
//! reference from its storage backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DeletionRequestStatus {
    Pending,
    Running,
    Done,
    Error,
}

impl DeletionRequestStatus {
    /// Conflict checks only care about "still in flight" vs "settled":
    /// while pending or running, no new owner may attach to the reference.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            DeletionRequestStatus::Pending | DeletionRequestStatus::Running
        )
    }
}

impl Display for DeletionRequestStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DeletionRequestStatus::Pending => write!(f, "pending"),
            DeletionRequestStatus::Running => write!(f, "running"),
            DeletionRequestStatus::Done => write!(f, "done"),
            DeletionRequestStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for DeletionRequestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeletionRequestStatus::Pending),
            "running" => Ok(DeletionRequestStatus::Running),
            "done" => Ok(DeletionRequestStatus::Done),
            "error" => Ok(DeletionRequestStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid deletion request status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FileDeletionRequest {
    pub id: Uuid,
    pub file_reference_id: Uuid,
    pub status: DeletionRequestStatus,
    /// When set, the reference row is removed even if physical deletion fails.
    pub force: bool,
    pub group_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_statuses() {
        assert!(DeletionRequestStatus::Pending.is_active());
        assert!(DeletionRequestStatus::Running.is_active());
        assert!(!DeletionRequestStatus::Done.is_active());
        assert!(!DeletionRequestStatus::Error.is_active());
    }

    #[test]
    fn test_status_round_trip() {
        for s in [
            DeletionRequestStatus::Pending,
            DeletionRequestStatus::Running,
            DeletionRequestStatus::Done,
            DeletionRequestStatus::Error,
        ] {
            assert_eq!(s.to_string().parse::<DeletionRequestStatus>().unwrap(), s);
        }
        assert!("cancelled".parse::<DeletionRequestStatus>().is_err());
    }
}
