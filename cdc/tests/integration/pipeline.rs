use cdc::test_utils::{
    invitation_created, malformed_record, membership_created, organization_created,
    profile_created, profile_removed, profile_updated, unmapped_record,
};
use cdc::types::{BatchStatus, Cell, EventOutcome, FailureReason};

use crate::support::processor;
use cdc::store::memory::MemoryConnector;

fn user_key(id: &str) -> Vec<(String, Cell)> {
    vec![("id".to_string(), Cell::String(id.to_string()))]
}

#[tokio::test]
async fn profile_lifecycle_is_projected_onto_the_users_table() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());
    let client = connector.client();

    let outcome = processor
        .process(vec![profile_created("p1", "a@x.com", "1")])
        .await;
    assert_eq!(outcome.status, BatchStatus::Ok);
    let row = client.row("users", &user_key("p1")).await.unwrap();
    assert_eq!(row.columns[0].1, Cell::String("a@x.com".to_string()));

    let outcome = processor
        .process(vec![profile_updated("p1", "b@x.com", "2")])
        .await;
    assert_eq!(outcome.status, BatchStatus::Ok);
    let row = client.row("users", &user_key("p1")).await.unwrap();
    assert_eq!(row.columns[0].1, Cell::String("b@x.com".to_string()));

    let outcome = processor.process(vec![profile_removed("p1", "3")]).await;
    assert_eq!(outcome.status, BatchStatus::Ok);
    assert!(client.row("users", &user_key("p1")).await.is_none());
}

#[tokio::test]
async fn redelivered_batch_is_idempotent() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());
    let client = connector.client();

    let batch = vec![
        profile_created("p1", "a@x.com", "1"),
        organization_created("o1", "Acme", "2"),
    ];

    let first = processor.process(batch.clone()).await;
    assert_eq!(first.status, BatchStatus::Ok);
    let row_after_first = client.row("users", &user_key("p1")).await.unwrap();

    let second = processor.process(batch).await;
    assert_eq!(second.status, BatchStatus::Ok);
    assert_eq!(second.applied_count(), 2);

    assert_eq!(client.table_len("users").await, 1);
    assert_eq!(client.table_len("organizations").await, 1);
    let row_after_second = client.row("users", &user_key("p1")).await.unwrap();
    assert_eq!(row_after_first, row_after_second);
}

#[tokio::test]
async fn all_entities_route_to_their_target_tables() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());
    let client = connector.client();

    let outcome = processor
        .process(vec![
            profile_created("p1", "a@x.com", "1"),
            organization_created("o1", "Acme", "2"),
            membership_created("o1", "p1", "admin", "3"),
            invitation_created("i1", "o1", "new@x.com", "4"),
        ])
        .await;

    assert_eq!(outcome.status, BatchStatus::Ok);
    assert_eq!(outcome.applied_count(), 4);
    assert_eq!(client.table_len("users").await, 1);
    assert_eq!(client.table_len("organizations").await, 1);
    assert_eq!(client.table_len("memberships").await, 1);
    assert_eq!(client.table_len("invitations").await, 1);
}

#[tokio::test]
async fn unmapped_entities_are_skipped_not_failed() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());

    let outcome = processor
        .process(vec![
            profile_created("p1", "a@x.com", "1"),
            unmapped_record("audit_log", "2"),
        ])
        .await;

    assert_eq!(outcome.status, BatchStatus::OkWithWarnings);
    assert!(!outcome.should_redeliver());
    assert_eq!(outcome.records[1].outcome, EventOutcome::SkippedUnmapped);
    assert_eq!(connector.client().table_len("users").await, 1);
}

#[tokio::test]
async fn malformed_records_fail_individually() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());

    let outcome = processor
        .process(vec![
            malformed_record("profiles", "1"),
            profile_created("p2", "b@x.com", "2"),
        ])
        .await;

    assert_eq!(outcome.status, BatchStatus::OkWithWarnings);
    assert_eq!(outcome.failed_count(), 1);
    match &outcome.records[0].outcome {
        EventOutcome::Failed { reason, .. } => assert_eq!(*reason, FailureReason::Malformed),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(outcome.records[1].outcome, EventOutcome::Applied);
}

#[tokio::test]
async fn outcome_records_preserve_delivery_order() {
    let connector = MemoryConnector::new();
    let processor = processor(connector);

    let outcome = processor
        .process(vec![
            profile_created("p1", "a@x.com", "1"),
            unmapped_record("audit_log", "2"),
            organization_created("o1", "Acme", "3"),
        ])
        .await;

    let indexes: Vec<usize> = outcome.records.iter().map(|record| record.index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
    assert_eq!(outcome.records[0].source_entity, "profiles");
    assert_eq!(outcome.records[1].source_entity, "audit_log");
    assert_eq!(outcome.records[2].source_entity, "organizations");
}
