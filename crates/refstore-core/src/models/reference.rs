//! File reference model: the canonical record of one stored (or externally
//! referenced) artifact at one storage location.
//!
//! Natural key is (storage, checksum); the synthetic id exists for foreign
//! keys only. At most one row per natural key may exist at any time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Descriptive metadata carried by incoming file requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetaInfo {
    pub checksum: String,
    pub checksum_algorithm: String,
    pub file_name: String,
    pub size: i64,
    pub mime_type: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// Coarse file kind (image, video, ...) when the submitter knows it.
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FileReference {
    pub id: Uuid,
    /// Storage backend identifier this artifact lives on.
    pub storage: String,
    pub checksum: String,
    pub checksum_algorithm: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub kind: Option<String>,
    pub archived: bool,
    pub origin_url: Option<String>,
    /// Owner tokens holding this reference live. Empty means deletion candidate.
    pub owners: Vec<String>,
    /// True while the artifact is merely referenced at its origin URL and has
    /// not been copied into the storage backend yet.
    pub referenced: bool,
    /// Set while a deletion or archive action is queued against this row.
    pub pending_action: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileReference {
    pub fn has_owner(&self, owner: &str) -> bool {
        self.owners.iter().any(|o| o == owner)
    }

    /// A reference with no remaining owners may be physically removed.
    pub fn is_deletion_candidate(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(owners: &[&str]) -> FileReference {
        FileReference {
            id: Uuid::new_v4(),
            storage: "S1".to_string(),
            checksum: "abc123".to_string(),
            checksum_algorithm: "SHA-256".to_string(),
            file_name: "report.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size: 1024,
            width: None,
            height: None,
            kind: None,
            archived: false,
            origin_url: None,
            owners: owners.iter().map(|s| s.to_string()).collect(),
            referenced: false,
            pending_action: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_owner() {
        let r = reference(&["alice", "bob"]);
        assert!(r.has_owner("alice"));
        assert!(r.has_owner("bob"));
        assert!(!r.has_owner("carol"));
    }

    #[test]
    fn test_deletion_candidate() {
        assert!(reference(&[]).is_deletion_candidate());
        assert!(!reference(&["alice"]).is_deletion_candidate());
    }
}
