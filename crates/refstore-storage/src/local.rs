use crate::traits::{StorageClass, StoragePlugin, StorageError, StorageResult, StoredLocation};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage plugin, the reference backend implementation.
#[derive(Clone)]
pub struct LocalStoragePlugin {
    storage_id: String,
    base_path: PathBuf,
}

impl LocalStoragePlugin {
    /// Create a new plugin rooted at `base_path`, registered as `storage_id`.
    pub async fn new(storage_id: impl Into<String>, base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStoragePlugin {
            storage_id: storage_id.into(),
            base_path,
        })
    }

    /// Convert a storage key to a filesystem path, rejecting traversal
    /// sequences that could escape the base directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }
        Ok(self.base_path.join(key))
    }

    fn build_key(file_name: &str, store_path: Option<&str>) -> String {
        match store_path {
            Some(dir) => format!("{}/{}", dir.trim_matches('/'), file_name),
            None => file_name.to_string(),
        }
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StoragePlugin for LocalStoragePlugin {
    fn storage_id(&self) -> &str {
        &self.storage_id
    }

    fn storage_class(&self) -> StorageClass {
        StorageClass::Online
    }

    async fn store(
        &self,
        file_name: &str,
        store_path: Option<&str>,
        data: Bytes,
    ) -> StorageResult<StoredLocation> {
        let key = Self::build_key(file_name, store_path);
        let path = self.key_to_path(&key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::StoreFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::StoreFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::StoreFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            storage = %self.storage_id,
            key = %key,
            size_bytes = size,
            "Local storage store successful"
        );

        Ok(StoredLocation { key, url: None })
    }

    async fn retrieve(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::RetrieveFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(storage = %self.storage_id, key = %key, "Local storage delete successful");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn plugin() -> (TempDir, LocalStoragePlugin) {
        let dir = TempDir::new().unwrap();
        let plugin = LocalStoragePlugin::new("local", dir.path()).await.unwrap();
        (dir, plugin)
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let (_dir, plugin) = plugin().await;

        let location = plugin
            .store("report.pdf", Some("invoices/2024"), Bytes::from_static(b"content"))
            .await
            .unwrap();
        assert_eq!(location.key, "invoices/2024/report.pdf");

        let data = plugin.retrieve(&location.key).await.unwrap();
        assert_eq!(&data[..], b"content");
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, plugin) = plugin().await;

        let location = plugin
            .store("a.bin", None, Bytes::from_static(b"x"))
            .await
            .unwrap();
        plugin.delete(&location.key).await.unwrap();

        assert!(matches!(
            plugin.retrieve(&location.key).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            plugin.delete(&location.key).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let (_dir, plugin) = plugin().await;

        assert!(matches!(
            plugin.retrieve("../outside").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
