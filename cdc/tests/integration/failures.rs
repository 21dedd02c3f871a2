use cdc::cdc_error;
use cdc::error::ErrorKind;
use cdc::store::memory::MemoryConnector;
use cdc::test_utils::{membership_created, organization_created, profile_created};
use cdc::types::{BatchStatus, EventOutcome, FailureReason};

use crate::support::{fast_reconnection, init_test_tracing, processor};
use cdc::processor::BatchProcessor;
use config::shared::BatchConfig;

#[tokio::test]
async fn constraint_failures_are_confined_to_their_event() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());
    let client = connector.client();
    client.declare_reference("memberships", "organization_id", "organizations");

    // The membership arrives before its organization exists.
    let outcome = processor
        .process(vec![
            membership_created("o1", "p1", "admin", "1"),
            profile_created("p1", "a@x.com", "2"),
        ])
        .await;

    assert_eq!(outcome.status, BatchStatus::OkWithWarnings);
    assert!(!outcome.should_redeliver());
    match &outcome.records[0].outcome {
        EventOutcome::Failed { reason, .. } => assert_eq!(*reason, FailureReason::Constraint),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(outcome.records[1].outcome, EventOutcome::Applied);
    assert_eq!(client.table_len("users").await, 1);
    assert_eq!(client.table_len("memberships").await, 0);
}

#[tokio::test]
async fn redelivered_membership_applies_once_the_organization_exists() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());
    let client = connector.client();
    client.declare_reference("memberships", "organization_id", "organizations");

    let failed = processor
        .process(vec![membership_created("o1", "p1", "admin", "1")])
        .await;
    assert_eq!(failed.failed_count(), 1);

    processor
        .process(vec![organization_created("o1", "Acme", "2")])
        .await;

    let retried = processor
        .process(vec![membership_created("o1", "p1", "admin", "1")])
        .await;
    assert_eq!(retried.status, BatchStatus::Ok);
    assert_eq!(client.table_len("memberships").await, 1);
}

#[tokio::test]
async fn connectivity_failure_aborts_the_rest_of_the_batch() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());
    let client = connector.client();

    processor
        .process(vec![profile_created("p0", "z@x.com", "1")])
        .await;

    client
        .fail_next(cdc_error!(ErrorKind::ConnectionFailed, "link lost"))
        .await;

    let outcome = processor
        .process(vec![
            profile_created("p1", "a@x.com", "2"),
            profile_created("p2", "b@x.com", "3"),
            profile_created("p3", "c@x.com", "4"),
        ])
        .await;

    assert_eq!(outcome.status, BatchStatus::Retry);
    assert!(outcome.should_redeliver());
    // The failing event and everything after it are redelivered.
    assert_eq!(outcome.unprocessed, 3);
    assert!(outcome.records.is_empty());
    assert_eq!(client.table_len("users").await, 1);
}

#[tokio::test]
async fn connectivity_failure_invalidates_the_cached_connection() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());
    let client = connector.client();

    processor
        .process(vec![profile_created("p1", "a@x.com", "1")])
        .await;
    assert_eq!(processor.connection().establishment_count(), 1);

    client
        .fail_next(cdc_error!(ErrorKind::ConnectionFailed, "link lost"))
        .await;
    let aborted = processor
        .process(vec![profile_created("p2", "b@x.com", "2")])
        .await;
    assert_eq!(aborted.status, BatchStatus::Retry);

    // The redelivered batch reconnects and succeeds.
    let retried = processor
        .process(vec![profile_created("p2", "b@x.com", "2")])
        .await;
    assert_eq!(retried.status, BatchStatus::Ok);
    assert_eq!(processor.connection().establishment_count(), 2);
}

#[tokio::test]
async fn failed_establishment_is_fatal_with_nothing_attempted() {
    init_test_tracing();
    let connector = MemoryConnector::new();
    connector.fail_connections(1);
    let batch = BatchConfig {
        max_size: 1000,
        deadline_ms: 0,
    };
    let processor = BatchProcessor::new(connector.clone(), batch, fast_reconnection(1));

    let outcome = processor
        .process(vec![
            profile_created("p1", "a@x.com", "1"),
            profile_created("p2", "b@x.com", "2"),
        ])
        .await;

    assert_eq!(outcome.status, BatchStatus::Fatal);
    assert!(outcome.should_redeliver());
    assert_eq!(outcome.unprocessed, 2);
    assert!(outcome.records.is_empty());
    assert!(outcome.fatal_detail.is_some());
    assert_eq!(connector.client().table_len("users").await, 0);

    // The scripted failure is gone; redelivery succeeds end to end.
    let retried = processor
        .process(vec![
            profile_created("p1", "a@x.com", "1"),
            profile_created("p2", "b@x.com", "2"),
        ])
        .await;
    assert_eq!(retried.status, BatchStatus::Ok);
}
