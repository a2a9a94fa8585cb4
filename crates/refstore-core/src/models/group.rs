//! Request group models: a caller-defined correlation id spanning many
//! individual file requests, tracked until every item has reported a result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Reference,
    Store,
    Delete,
    Copy,
}

impl Display for RequestType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RequestType::Reference => write!(f, "reference"),
            RequestType::Store => write!(f, "store"),
            RequestType::Delete => write!(f, "delete"),
            RequestType::Copy => write!(f, "copy"),
        }
    }
}

impl FromStr for RequestType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reference" => Ok(RequestType::Reference),
            "store" => Ok(RequestType::Store),
            "delete" => Ok(RequestType::Delete),
            "copy" => Ok(RequestType::Copy),
            _ => Err(anyhow::anyhow!("Invalid request type: {}", s)),
        }
    }
}

/// Group lifecycle. `Denied` groups are never persisted; they only exist as
/// a terminal notification to the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Granted,
    Denied,
    Success,
    Error,
}

impl GroupStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GroupStatus::Granted)
    }
}

impl Display for GroupStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            GroupStatus::Granted => write!(f, "granted"),
            GroupStatus::Denied => write!(f, "denied"),
            GroupStatus::Success => write!(f, "success"),
            GroupStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for GroupStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "granted" => Ok(GroupStatus::Granted),
            "denied" => Ok(GroupStatus::Denied),
            "success" => Ok(GroupStatus::Success),
            "error" => Ok(GroupStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid group status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RequestGroup {
    /// External correlation key, unique across all groups.
    pub id: String,
    pub request_type: RequestType,
    /// Number of individual requests announced at grant time. Completion is
    /// derived by comparing persisted result rows against this, never from a
    /// live counter, so it survives crash/restart and duplicate delivery.
    pub expected_count: i64,
    pub expiration_date: Option<DateTime<Utc>>,
    pub status: GroupStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One outcome record for one item of a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RequestResultInfo {
    pub id: Uuid,
    pub group_id: String,
    pub checksum: String,
    pub storage: String,
    pub store_path: Option<String>,
    pub owners: Vec<String>,
    /// Set on success: the reference the request resolved to.
    pub file_reference_id: Option<Uuid>,
    /// Set on error; `None` means the item succeeded.
    pub error_cause: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RequestResultInfo {
    pub fn is_error(&self) -> bool {
        self.error_cause.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_status_terminal() {
        assert!(!GroupStatus::Granted.is_terminal());
        assert!(GroupStatus::Denied.is_terminal());
        assert!(GroupStatus::Success.is_terminal());
        assert!(GroupStatus::Error.is_terminal());
    }

    #[test]
    fn test_request_type_round_trip() {
        for t in [
            RequestType::Reference,
            RequestType::Store,
            RequestType::Delete,
            RequestType::Copy,
        ] {
            assert_eq!(t.to_string().parse::<RequestType>().unwrap(), t);
        }
        assert!("move".parse::<RequestType>().is_err());
    }
}
