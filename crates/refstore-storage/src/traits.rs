//! Storage plugin trait
//!
//! This module defines the capability set every storage backend exposes to
//! the engine: store, retrieve, delete. Transfer protocol details stay
//! inside the plugin.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Store failed: {0}")]
    StoreFailed(String),

    #[error("Retrieve failed: {0}")]
    RetrieveFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Availability class of a backend. Nearline media require an asynchronous
/// restore step before a retrieve can succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Online,
    Nearline,
}

/// Where a plugin placed a stored artifact.
#[derive(Debug, Clone)]
pub struct StoredLocation {
    /// Key within the backend, relative to its root.
    pub key: String,
    /// Publicly resolvable URL when the backend exposes one.
    pub url: Option<String>,
}

/// Capability set consumed by the engine.
///
/// Implementations must be safe to call concurrently; the engine issues
/// operations from multiple consumer tasks at once.
#[async_trait]
pub trait StoragePlugin: Send + Sync {
    /// Identifier this plugin is registered under; matches the `storage`
    /// field of incoming requests.
    fn storage_id(&self) -> &str;

    fn storage_class(&self) -> StorageClass;

    /// Store a file under the given sub-directory (when provided) and
    /// return its location.
    async fn store(
        &self,
        file_name: &str,
        store_path: Option<&str>,
        data: Bytes,
    ) -> StorageResult<StoredLocation>;

    /// Retrieve a stored file by its key.
    async fn retrieve(&self, key: &str) -> StorageResult<Bytes>;

    /// Delete a stored file by its key.
    async fn delete(&self, key: &str) -> StorageResult<()>;
}
