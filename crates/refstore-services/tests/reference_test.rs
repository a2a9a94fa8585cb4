#[path = "helpers/mod.rs"]
mod helpers;

use helpers::{reference_item, session, setup};

use refstore_core::events::FileEventKind;
use refstore_core::models::{DeletionRequestStatus, ItemDisposition, ItemOutcome, ReferenceItem};

#[tokio::test]
async fn test_created_updated_unmodified_sequence() {
    let engine = setup();
    let session = session();

    // alice references a new checksum: Created with owners = {alice}
    let outcomes = engine
        .orchestrator
        .reference("g-1", vec![reference_item("alice", "S1", "abc123")], &session)
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].disposition(), Some(ItemDisposition::Created));
    let reference = outcomes[0].reference().unwrap();
    assert_eq!(reference.owners, vec!["alice".to_string()]);

    // bob references the same file: Updated with owners = {alice, bob}
    let outcomes = engine
        .orchestrator
        .reference("g-2", vec![reference_item("bob", "S1", "abc123")], &session)
        .await
        .unwrap();
    assert_eq!(outcomes[0].disposition(), Some(ItemDisposition::Updated));
    let reference = outcomes[0].reference().unwrap();
    assert_eq!(
        reference.owners,
        vec!["alice".to_string(), "bob".to_string()]
    );

    // bob again: Unmodified, no duplicate owner entry
    let outcomes = engine
        .orchestrator
        .reference("g-3", vec![reference_item("bob", "S1", "abc123")], &session)
        .await
        .unwrap();
    assert_eq!(outcomes[0].disposition(), Some(ItemDisposition::Unmodified));
    let reference = outcomes[0].reference().unwrap();
    assert_eq!(
        reference.owners,
        vec!["alice".to_string(), "bob".to_string()]
    );

    // the whole sequence produced exactly one row for (S1, abc123)
    assert_eq!(engine.store.reference_count(), 1);
}

#[tokio::test]
async fn test_duplicates_within_one_batch_do_not_race() {
    let engine = setup();

    let outcomes = engine
        .orchestrator
        .reference(
            "g-1",
            vec![
                reference_item("alice", "S1", "abc123"),
                reference_item("bob", "S1", "abc123"),
                reference_item("bob", "S1", "abc123"),
            ],
            &session(),
        )
        .await
        .unwrap();

    assert_eq!(outcomes[0].disposition(), Some(ItemDisposition::Created));
    assert_eq!(outcomes[1].disposition(), Some(ItemDisposition::Updated));
    assert_eq!(outcomes[2].disposition(), Some(ItemDisposition::Unmodified));
    assert_eq!(engine.store.reference_count(), 1);
}

#[tokio::test]
async fn test_same_checksum_on_different_storages_is_independent() {
    let engine = setup();

    engine
        .orchestrator
        .reference("g-1", vec![reference_item("alice", "S1", "abc123")], &session())
        .await
        .unwrap();
    let outcomes = engine
        .orchestrator
        .reference("g-2", vec![reference_item("alice", "S2", "abc123")], &session())
        .await
        .unwrap();

    assert_eq!(outcomes[0].disposition(), Some(ItemDisposition::Created));
    assert_eq!(engine.store.reference_count(), 2);
}

#[tokio::test]
async fn test_reference_denied_while_deletion_running() {
    let engine = setup();
    let session = session();

    let outcomes = engine
        .orchestrator
        .reference("g-1", vec![reference_item("alice", "S1", "abc123")], &session)
        .await
        .unwrap();
    let reference = outcomes[0].reference().unwrap().clone();

    engine
        .store
        .seed_deletion(reference.id, DeletionRequestStatus::Running);

    let outcomes = engine
        .orchestrator
        .reference("g-2", vec![reference_item("bob", "S1", "abc123")], &session)
        .await
        .unwrap();

    match &outcomes[0] {
        ItemOutcome::Err { cause, .. } => assert!(cause.contains("being deleted")),
        other => panic!("expected error outcome, got {:?}", other.disposition()),
    }

    // Reference and deletion request are untouched.
    let current = engine.store.deletion_requests();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].status, DeletionRequestStatus::Running);
    assert_eq!(
        engine
            .store
            .results("g-2")
            .iter()
            .filter(|r| r.is_error())
            .count(),
        1
    );
}

#[tokio::test]
async fn test_settled_deletion_request_is_cancelled_by_re_reference() {
    let engine = setup();
    let session = session();

    let outcomes = engine
        .orchestrator
        .reference("g-1", vec![reference_item("alice", "S1", "abc123")], &session)
        .await
        .unwrap();
    let reference = outcomes[0].reference().unwrap().clone();

    engine
        .store
        .seed_deletion(reference.id, DeletionRequestStatus::Error);

    let outcomes = engine
        .orchestrator
        .reference("g-2", vec![reference_item("bob", "S1", "abc123")], &session)
        .await
        .unwrap();

    assert_eq!(outcomes[0].disposition(), Some(ItemDisposition::Updated));
    assert!(engine.store.deletion_requests().is_empty());
}

#[tokio::test]
async fn test_checksum_mismatch_for_shared_url() {
    let engine = setup();
    let session = session();

    let mut first = reference_item("alice", "S1", "abc123");
    first.url = Some("https://example.org/artifact".to_string());
    engine
        .orchestrator
        .reference("g-1", vec![first], &session)
        .await
        .unwrap();

    let mut second = reference_item("bob", "S1", "fff999");
    second.url = Some("https://example.org/artifact".to_string());
    let outcomes = engine
        .orchestrator
        .reference("g-2", vec![second], &session)
        .await
        .unwrap();

    match &outcomes[0] {
        ItemOutcome::Err { cause, .. } => assert!(cause.contains("Checksum mismatch")),
        _ => panic!("expected checksum mismatch"),
    }
    assert_eq!(engine.store.reference_count(), 1);
}

#[tokio::test]
async fn test_invalid_item_denies_only_itself() {
    let engine = setup();
    let session = session();

    let invalid = ReferenceItem {
        owner: String::new(),
        ..reference_item("bob", "S1", "def456")
    };
    let outcomes = engine
        .orchestrator
        .reference(
            "g-1",
            vec![
                reference_item("alice", "S1", "abc123"),
                invalid,
                reference_item("carol", "S1", "0f0f0f"),
            ],
            &session,
        )
        .await
        .unwrap();

    assert!(outcomes[0].is_ok());
    assert!(!outcomes[1].is_ok());
    assert!(outcomes[2].is_ok());
    assert_eq!(engine.store.reference_count(), 2);

    // All three results are recorded, exactly one of them an error.
    let results = engine.store.results("g-1");
    assert_eq!(results.len(), 3);
    assert_eq!(results.iter().filter(|r| r.is_error()).count(), 1);
}

#[tokio::test]
async fn test_session_counters_and_file_events() {
    let engine = setup();
    let session = session();

    engine
        .orchestrator
        .reference(
            "g-1",
            vec![
                reference_item("alice", "S1", "abc123"),
                reference_item("alice", "S1", "abc123"),
            ],
            &session,
        )
        .await
        .unwrap();

    let counters = engine.notifier.counters();
    assert_eq!(counters.running, 0);
    assert_eq!(counters.reference_requests, 1);
    // Created counts, the Unmodified duplicate does not.
    assert_eq!(counters.referenced_files, 1);
    assert_eq!(counters.denied, 0);

    let events = engine.publisher.file_events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.kind == FileEventKind::Stored));
}

#[tokio::test]
async fn test_empty_batch_is_denied() {
    let engine = setup();

    let result = engine
        .orchestrator
        .reference("g-empty", Vec::new(), &session())
        .await;

    assert!(result.is_err());
    // The group was never persisted; only a Denied event went out.
    assert!(engine.store.group("g-empty").is_none());
    let events = engine.publisher.group_events();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].kind,
        refstore_core::events::GroupEventKind::Denied
    );
}
