use cdc::store::memory::MemoryConnector;
use cdc::test_utils::{profile_created, profile_updated};
use cdc::types::{BatchStatus, Cell, EventOutcome};

use crate::support::processor;

fn user_key(id: &str) -> Vec<(String, Cell)> {
    vec![("id".to_string(), Cell::String(id.to_string()))]
}

#[tokio::test]
async fn stale_events_are_discarded_by_the_ordering_guard() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());
    let client = connector.client();

    processor
        .process(vec![profile_updated("p1", "new@x.com", "5")])
        .await;

    // An older change for the same row arrives late.
    let outcome = processor
        .process(vec![profile_updated("p1", "old@x.com", "3")])
        .await;

    assert_eq!(outcome.status, BatchStatus::Ok);
    assert_eq!(outcome.records[0].outcome, EventOutcome::SkippedStale);

    let row = client.row("users", &user_key("p1")).await.unwrap();
    assert_eq!(row.columns[0].1, Cell::String("new@x.com".to_string()));
}

#[tokio::test]
async fn equal_tokens_are_reapplied_without_changing_state() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());
    let client = connector.client();

    processor
        .process(vec![profile_created("p1", "a@x.com", "7")])
        .await;
    let before = client.row("users", &user_key("p1")).await.unwrap();

    // Redelivery of the applied event carries the same token.
    let outcome = processor
        .process(vec![profile_created("p1", "a@x.com", "7")])
        .await;

    assert_eq!(outcome.status, BatchStatus::Ok);
    assert_eq!(outcome.records[0].outcome, EventOutcome::Applied);
    assert_eq!(client.row("users", &user_key("p1")).await.unwrap(), before);
}

#[tokio::test]
async fn token_comparison_is_numeric_not_lexicographic() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());
    let client = connector.client();

    processor
        .process(vec![profile_updated("p1", "ninth@x.com", "9")])
        .await;

    // "10" sorts before "9" lexicographically but is newer numerically.
    let outcome = processor
        .process(vec![profile_updated("p1", "tenth@x.com", "10")])
        .await;
    assert_eq!(outcome.records[0].outcome, EventOutcome::Applied);

    let row = client.row("users", &user_key("p1")).await.unwrap();
    assert_eq!(row.columns[0].1, Cell::String("tenth@x.com".to_string()));
}

#[tokio::test]
async fn leading_zeros_do_not_defeat_the_guard() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());

    processor
        .process(vec![profile_updated("p1", "a@x.com", "0042")])
        .await;

    let outcome = processor
        .process(vec![profile_updated("p1", "b@x.com", "41")])
        .await;
    assert_eq!(outcome.records[0].outcome, EventOutcome::SkippedStale);

    let outcome = processor
        .process(vec![profile_updated("p1", "c@x.com", "42")])
        .await;
    assert_eq!(outcome.records[0].outcome, EventOutcome::Applied);
}

#[tokio::test]
async fn the_guard_tracks_rows_independently() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());

    processor
        .process(vec![profile_updated("p1", "a@x.com", "10")])
        .await;

    // A lower token for a different row is not stale.
    let outcome = processor
        .process(vec![profile_updated("p2", "b@x.com", "2")])
        .await;
    assert_eq!(outcome.records[0].outcome, EventOutcome::Applied);
}
