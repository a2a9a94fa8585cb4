//! Shared wiring for the engine integration tests: an orchestrator built on
//! the in-memory stores with recording collaborators and stub plugins for
//! the "S1" and "S2" storages.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use refstore_core::models::{DeleteItem, FileMetaInfo, ReferenceItem, SessionInfo, StorageItem};
use refstore_core::EngineConfig;
use refstore_services::test_helpers::{InMemoryStore, RecordingNotifier, RecordingPublisher};
use refstore_services::{GroupTracker, GroupTrackerConfig, RequestOrchestrator, StatusEngine};
use refstore_storage::{
    PluginRegistry, StorageClass, StoragePlugin, StorageResult, StoredLocation,
};

/// Plugin stub: pretends every operation succeeds.
pub struct StubPlugin {
    id: String,
}

#[async_trait]
impl StoragePlugin for StubPlugin {
    fn storage_id(&self) -> &str {
        &self.id
    }

    fn storage_class(&self) -> StorageClass {
        StorageClass::Online
    }

    async fn store(
        &self,
        file_name: &str,
        store_path: Option<&str>,
        _data: Bytes,
    ) -> StorageResult<StoredLocation> {
        let key = match store_path {
            Some(dir) => format!("{}/{}", dir, file_name),
            None => file_name.to_string(),
        };
        Ok(StoredLocation { key, url: None })
    }

    async fn retrieve(&self, _key: &str) -> StorageResult<Bytes> {
        Ok(Bytes::new())
    }

    async fn delete(&self, _key: &str) -> StorageResult<()> {
        Ok(())
    }
}

pub struct TestEngine {
    pub store: InMemoryStore,
    pub publisher: RecordingPublisher,
    pub notifier: RecordingNotifier,
    pub tracker: GroupTracker,
    pub status_engine: StatusEngine,
    pub orchestrator: RequestOrchestrator,
}

pub fn setup() -> TestEngine {
    setup_with_config(EngineConfig::default())
}

pub fn setup_with_config(config: EngineConfig) -> TestEngine {
    let store = InMemoryStore::new();
    let publisher = RecordingPublisher::new();
    let notifier = RecordingNotifier::new();

    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(StubPlugin {
        id: "S1".to_string(),
    }));
    registry.register(Arc::new(StubPlugin {
        id: "S2".to_string(),
    }));

    let references = Arc::new(store.clone());
    let deletions = Arc::new(store.clone());
    let storage_requests = Arc::new(store.clone());
    let groups = Arc::new(store.clone());

    let status_engine = StatusEngine::new(
        references.clone(),
        deletions.clone(),
        storage_requests.clone(),
        config.clone(),
    );
    let tracker = GroupTracker::new(
        groups,
        Arc::new(publisher.clone()),
        GroupTrackerConfig::from(&config),
    );
    let orchestrator = RequestOrchestrator::new(
        references,
        deletions,
        storage_requests,
        status_engine.clone(),
        tracker.clone(),
        Arc::new(registry),
        Arc::new(notifier.clone()),
        Arc::new(publisher.clone()),
    );

    TestEngine {
        store,
        publisher,
        notifier,
        tracker,
        status_engine,
        orchestrator,
    }
}

pub fn session() -> SessionInfo {
    SessionInfo {
        session_owner: Some("tester".to_string()),
        session: Some("session-1".to_string()),
    }
}

pub fn meta(checksum: &str) -> FileMetaInfo {
    FileMetaInfo {
        checksum: checksum.to_string(),
        checksum_algorithm: "SHA-256".to_string(),
        file_name: format!("{}.bin", checksum),
        size: 1024,
        mime_type: "application/octet-stream".to_string(),
        width: None,
        height: None,
        kind: None,
    }
}

pub fn reference_item(owner: &str, storage: &str, checksum: &str) -> ReferenceItem {
    ReferenceItem {
        owner: owner.to_string(),
        storage: storage.to_string(),
        url: None,
        meta: meta(checksum),
    }
}

pub fn storage_item(owners: &[&str], storage: &str, checksum: &str) -> StorageItem {
    StorageItem {
        owners: owners.iter().map(|s| s.to_string()).collect(),
        storage: storage.to_string(),
        store_path: None,
        origin_url: None,
        meta: meta(checksum),
    }
}

pub fn delete_item(owner: &str, storage: &str, checksum: &str) -> DeleteItem {
    DeleteItem {
        owner: owner.to_string(),
        storage: storage.to_string(),
        checksum: checksum.to_string(),
    }
}
