//! Structural validation of incoming request items.
//!
//! A validation failure denies the single item it belongs to, never the
//! whole batch.

use crate::error::AppError;
use crate::models::{CopyItem, DeleteItem, FileMetaInfo, ReferenceItem, StorageItem};

pub fn validate_meta_info(meta: &FileMetaInfo) -> Result<(), AppError> {
    if meta.checksum.trim().is_empty() {
        return Err(AppError::InvalidInput("checksum must not be empty".into()));
    }
    if meta.checksum_algorithm.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "checksum algorithm must not be empty".into(),
        ));
    }
    if meta.file_name.trim().is_empty() {
        return Err(AppError::InvalidInput("file name must not be empty".into()));
    }
    if meta.size < 0 {
        return Err(AppError::InvalidInput(format!(
            "file size must not be negative: {}",
            meta.size
        )));
    }
    Ok(())
}

pub fn validate_reference_item(item: &ReferenceItem) -> Result<(), AppError> {
    if item.owner.trim().is_empty() {
        return Err(AppError::InvalidInput("owner must not be empty".into()));
    }
    if item.storage.trim().is_empty() {
        return Err(AppError::InvalidInput("storage must not be empty".into()));
    }
    validate_meta_info(&item.meta)
}

pub fn validate_storage_item(item: &StorageItem) -> Result<(), AppError> {
    if item.owners.is_empty() || item.owners.iter().any(|o| o.trim().is_empty()) {
        return Err(AppError::InvalidInput(
            "at least one non-empty owner is required".into(),
        ));
    }
    if item.storage.trim().is_empty() {
        return Err(AppError::InvalidInput("storage must not be empty".into()));
    }
    validate_meta_info(&item.meta)
}

pub fn validate_delete_item(item: &DeleteItem) -> Result<(), AppError> {
    if item.owner.trim().is_empty() {
        return Err(AppError::InvalidInput("owner must not be empty".into()));
    }
    if item.storage.trim().is_empty() {
        return Err(AppError::InvalidInput("storage must not be empty".into()));
    }
    if item.checksum.trim().is_empty() {
        return Err(AppError::InvalidInput("checksum must not be empty".into()));
    }
    Ok(())
}

pub fn validate_copy_item(item: &CopyItem) -> Result<(), AppError> {
    if item.owners.is_empty() || item.owners.iter().any(|o| o.trim().is_empty()) {
        return Err(AppError::InvalidInput(
            "at least one non-empty owner is required".into(),
        ));
    }
    if item.source_storage.trim().is_empty() || item.destination_storage.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "source and destination storage must not be empty".into(),
        ));
    }
    if item.checksum.trim().is_empty() {
        return Err(AppError::InvalidInput("checksum must not be empty".into()));
    }
    Ok(())
}

/// Validates the group id carried by an incoming batch envelope.
pub fn validate_group_id(group_id: &str) -> Result<(), AppError> {
    if group_id.trim().is_empty() {
        return Err(AppError::InvalidInput("group id must not be empty".into()));
    }
    if group_id.len() > 255 {
        return Err(AppError::InvalidInput(format!(
            "group id exceeds 255 characters: {}",
            group_id.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> FileMetaInfo {
        FileMetaInfo {
            checksum: "abc123".to_string(),
            checksum_algorithm: "SHA-256".to_string(),
            file_name: "report.pdf".to_string(),
            size: 1024,
            mime_type: "application/pdf".to_string(),
            width: None,
            height: None,
            kind: None,
        }
    }

    #[test]
    fn test_meta_info_validation() {
        assert!(validate_meta_info(&meta()).is_ok());

        let mut bad = meta();
        bad.checksum = "  ".to_string();
        assert!(validate_meta_info(&bad).is_err());

        let mut bad = meta();
        bad.size = -1;
        assert!(validate_meta_info(&bad).is_err());
    }

    #[test]
    fn test_reference_item_validation() {
        let item = ReferenceItem {
            owner: "alice".to_string(),
            storage: "S1".to_string(),
            url: None,
            meta: meta(),
        };
        assert!(validate_reference_item(&item).is_ok());

        let bad = ReferenceItem {
            owner: String::new(),
            ..item
        };
        assert!(validate_reference_item(&bad).is_err());
    }

    #[test]
    fn test_group_id_validation() {
        assert!(validate_group_id("batch-2024-08").is_ok());
        assert!(validate_group_id("").is_err());
        assert!(validate_group_id(&"x".repeat(256)).is_err());
    }
}
