use cdc::store::memory::MemoryConnector;
use cdc::test_utils::{organization_created, profile_created};
use cdc::types::BatchStatus;

use crate::support::processor;

#[tokio::test]
async fn one_connection_serves_many_batches() {
    let connector = MemoryConnector::new();
    let processor = processor(connector);

    for index in 0..5 {
        let outcome = processor
            .process(vec![profile_created(
                &format!("p{index}"),
                &format!("u{index}@x.com"),
                &format!("{index}"),
            )])
            .await;
        assert_eq!(outcome.status, BatchStatus::Ok);
    }

    assert_eq!(processor.connection().establishment_count(), 1);
    assert!(processor.connection().acquire_count() >= 5);
}

#[tokio::test]
async fn connection_state_survives_across_entities() {
    let connector = MemoryConnector::new();
    let processor = processor(connector.clone());

    processor
        .process(vec![profile_created("p1", "a@x.com", "1")])
        .await;
    processor
        .process(vec![organization_created("o1", "Acme", "2")])
        .await;

    assert_eq!(processor.connection().establishment_count(), 1);
    assert_eq!(connector.client().table_len("users").await, 1);
    assert_eq!(connector.client().table_len("organizations").await, 1);
}

#[tokio::test]
async fn explicit_invalidation_forces_a_new_connection() {
    let connector = MemoryConnector::new();
    let processor = processor(connector);

    processor
        .process(vec![profile_created("p1", "a@x.com", "1")])
        .await;
    processor.connection().invalidate().await;
    processor
        .process(vec![profile_created("p2", "b@x.com", "2")])
        .await;

    assert_eq!(processor.connection().establishment_count(), 2);
}
