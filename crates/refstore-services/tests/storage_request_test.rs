#[path = "helpers/mod.rs"]
mod helpers;

use helpers::{reference_item, session, setup, storage_item};

use refstore_core::models::{CopyItem, ItemDisposition, StorageRequestStatus};
use refstore_storage::StoredLocation;

#[tokio::test]
async fn test_store_accepts_and_creates_to_handle_request() {
    let engine = setup();

    let outcomes = engine
        .orchestrator
        .store("g-1", vec![storage_item(&["alice"], "S1", "abc123")], &session())
        .await
        .unwrap();

    assert_eq!(outcomes[0].disposition(), Some(ItemDisposition::Accepted));
    let requests = engine.store.storage_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].status, StorageRequestStatus::ToHandle);
    assert_eq!(requests[0].group_id, "g-1");
}

#[tokio::test]
async fn test_duplicate_submissions_for_same_key() {
    let engine = setup();
    let session = session();

    engine
        .orchestrator
        .store("g-1", vec![storage_item(&["alice"], "S1", "abc123")], &session)
        .await
        .unwrap();

    // At-least-once delivery: the same batch arrives again with another owner.
    let result = engine
        .orchestrator
        .store("g-1", vec![storage_item(&["bob"], "S1", "abc123")], &session)
        .await;
    // Same group id means the duplicate grant is rejected as a caller bug...
    assert!(result.is_err());

    // ...but owner merging within one submission still applies: one request,
    // not two, exists for the natural key after a same-group overlap.
    let outcomes = engine
        .orchestrator
        .store(
            "g-2",
            vec![
                storage_item(&["alice"], "S1", "def456"),
                storage_item(&["bob"], "S1", "def456"),
            ],
            &session,
        )
        .await
        .unwrap();
    assert!(outcomes.iter().all(|o| o.is_ok()));

    let mut requests = engine.store.storage_requests();
    requests.retain(|r| r.checksum == "def456");
    assert_eq!(requests.len(), 1);
    let mut owners = requests[0].owners.clone();
    owners.sort();
    assert_eq!(owners, vec!["alice".to_string(), "bob".to_string()]);
}

#[tokio::test]
async fn test_concurrent_key_from_other_group_is_delayed() {
    let engine = setup();
    let session = session();

    let outcomes = engine
        .orchestrator
        .store("g-1", vec![storage_item(&["alice"], "S1", "abc123")], &session)
        .await
        .unwrap();
    assert!(outcomes[0].is_ok());
    let first = engine.store.storage_requests().remove(0);
    engine.orchestrator.start_storage_request(first.id).await.unwrap();

    // A different group submits the same (storage, checksum) while the first
    // request is running.
    engine
        .orchestrator
        .store("g-2", vec![storage_item(&["bob"], "S1", "abc123")], &session)
        .await
        .unwrap();

    let delayed: Vec<_> = engine
        .store
        .storage_requests()
        .into_iter()
        .filter(|r| r.status == StorageRequestStatus::Delayed)
        .collect();
    assert_eq!(delayed.len(), 1);
    assert_eq!(delayed[0].group_id, "g-2");
}

#[tokio::test]
async fn test_store_delayed_while_deletion_active() {
    let engine = setup();
    let session = session();

    let outcomes = engine
        .orchestrator
        .reference("g-ref", vec![reference_item("alice", "S1", "abc123")], &session)
        .await
        .unwrap();
    let reference = outcomes[0].reference().unwrap().clone();
    engine.store.seed_deletion(
        reference.id,
        refstore_core::models::DeletionRequestStatus::Pending,
    );

    engine
        .orchestrator
        .store("g-1", vec![storage_item(&["bob"], "S1", "abc123")], &session)
        .await
        .unwrap();

    let requests = engine.store.storage_requests();
    assert_eq!(requests[0].status, StorageRequestStatus::Delayed);
}

#[tokio::test]
async fn test_sweep_promotes_once_blocker_clears() {
    let engine = setup();
    let session = session();

    engine
        .orchestrator
        .store("g-1", vec![storage_item(&["alice"], "S1", "abc123")], &session)
        .await
        .unwrap();
    let first = engine.store.storage_requests().remove(0);
    engine.orchestrator.start_storage_request(first.id).await.unwrap();

    engine
        .orchestrator
        .store("g-2", vec![storage_item(&["bob"], "S1", "abc123")], &session)
        .await
        .unwrap();

    // Blocker still running: the sweep promotes nothing.
    assert_eq!(engine.status_engine.check_delayed_storage_requests().await.unwrap(), 0);

    engine
        .orchestrator
        .complete_storage_request(
            first.id,
            Ok(StoredLocation {
                key: "abc123.bin".to_string(),
                url: None,
            }),
        )
        .await
        .unwrap();

    // Blocker done: exactly the delayed request graduates.
    assert_eq!(engine.status_engine.check_delayed_storage_requests().await.unwrap(), 1);
    let statuses: Vec<_> = engine
        .store
        .storage_requests()
        .into_iter()
        .filter(|r| r.group_id == "g-2")
        .map(|r| r.status)
        .collect();
    assert_eq!(statuses, vec![StorageRequestStatus::ToHandle]);

    // Running it again changes nothing.
    assert_eq!(engine.status_engine.check_delayed_storage_requests().await.unwrap(), 0);
}

#[tokio::test]
async fn test_complete_storage_request_creates_reference() {
    let engine = setup();
    let session = session();

    engine
        .orchestrator
        .store("g-1", vec![storage_item(&["alice"], "S1", "abc123")], &session)
        .await
        .unwrap();
    let request = engine.store.storage_requests().remove(0);

    engine.orchestrator.start_storage_request(request.id).await.unwrap();
    engine
        .orchestrator
        .complete_storage_request(
            request.id,
            Ok(StoredLocation {
                key: "media/abc123.bin".to_string(),
                url: None,
            }),
        )
        .await
        .unwrap();

    assert_eq!(engine.store.reference_count(), 1);
    let results = engine.store.results("g-1");
    assert_eq!(results.len(), 1);
    assert!(!results[0].is_error());
    assert_eq!(results[0].store_path.as_deref(), Some("media/abc123.bin"));

    // Completion of the only item makes the group reconcile to Success.
    engine.tracker.check_request_groups().await.unwrap();
    assert_eq!(
        engine.store.group("g-1").unwrap().status,
        refstore_core::models::GroupStatus::Success
    );
}

#[tokio::test]
async fn test_complete_storage_request_merges_into_existing_reference() {
    let engine = setup();
    let session = session();

    engine
        .orchestrator
        .reference("g-ref", vec![reference_item("alice", "S1", "abc123")], &session)
        .await
        .unwrap();

    engine
        .orchestrator
        .store("g-1", vec![storage_item(&["bob"], "S1", "abc123")], &session)
        .await
        .unwrap();
    let request = engine
        .store
        .storage_requests()
        .into_iter()
        .find(|r| r.group_id == "g-1")
        .unwrap();

    engine
        .orchestrator
        .complete_storage_request(
            request.id,
            Ok(StoredLocation {
                key: "abc123.bin".to_string(),
                url: None,
            }),
        )
        .await
        .unwrap();

    // Still a single row; bob joined the owner set.
    assert_eq!(engine.store.reference_count(), 1);
    let results = engine.store.results("g-1");
    let reference_id = results[0].file_reference_id.unwrap();
    let outcomes = engine
        .orchestrator
        .reference("g-check", vec![reference_item("bob", "S1", "abc123")], &session)
        .await
        .unwrap();
    assert_eq!(outcomes[0].disposition(), Some(ItemDisposition::Unmodified));
    assert_eq!(outcomes[0].reference().unwrap().id, reference_id);
}

#[tokio::test]
async fn test_complete_storage_request_error_keeps_cause() {
    let engine = setup();
    let session = session();

    engine
        .orchestrator
        .store("g-1", vec![storage_item(&["alice"], "S1", "abc123")], &session)
        .await
        .unwrap();
    let request = engine.store.storage_requests().remove(0);

    engine
        .orchestrator
        .complete_storage_request(request.id, Err("disk full".to_string()))
        .await
        .unwrap();

    let requests = engine.store.storage_requests();
    assert_eq!(requests[0].status, StorageRequestStatus::Error);
    assert_eq!(requests[0].error_cause.as_deref(), Some("disk full"));
    assert_eq!(engine.store.reference_count(), 0);

    engine.tracker.check_request_groups().await.unwrap();
    assert_eq!(
        engine.store.group("g-1").unwrap().status,
        refstore_core::models::GroupStatus::Error
    );
}

#[tokio::test]
async fn test_copy_funnels_source_meta_into_store_pipeline() {
    let engine = setup();
    let session = session();

    engine
        .orchestrator
        .reference("g-ref", vec![reference_item("alice", "S1", "abc123")], &session)
        .await
        .unwrap();

    let outcomes = engine
        .orchestrator
        .copy(
            "g-copy",
            vec![CopyItem {
                owners: vec!["alice".to_string()],
                source_storage: "S1".to_string(),
                checksum: "abc123".to_string(),
                destination_storage: "S2".to_string(),
                store_path: Some("copies".to_string()),
            }],
            &session,
        )
        .await
        .unwrap();
    assert_eq!(outcomes[0].disposition(), Some(ItemDisposition::Accepted));

    let request = engine.store.storage_requests().remove(0);
    assert_eq!(request.storage, "S2");
    assert_eq!(request.checksum, "abc123");
    assert_eq!(request.store_path.as_deref(), Some("copies"));

    engine
        .orchestrator
        .complete_storage_request(
            request.id,
            Ok(StoredLocation {
                key: "copies/abc123.bin".to_string(),
                url: None,
            }),
        )
        .await
        .unwrap();

    // Source untouched, destination gained its own canonical reference.
    assert_eq!(engine.store.reference_count(), 2);
}

#[tokio::test]
async fn test_copy_of_missing_source_is_an_item_error() {
    let engine = setup();

    let outcomes = engine
        .orchestrator
        .copy(
            "g-copy",
            vec![CopyItem {
                owners: vec!["alice".to_string()],
                source_storage: "S1".to_string(),
                checksum: "missing".to_string(),
                destination_storage: "S2".to_string(),
                store_path: None,
            }],
            &session(),
        )
        .await
        .unwrap();

    assert!(!outcomes[0].is_ok());
    assert!(engine.store.storage_requests().is_empty());
    let results = engine.store.results("g-copy");
    assert_eq!(results.len(), 1);
    assert!(results[0].is_error());
}
