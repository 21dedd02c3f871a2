use std::time::Duration;

use cdc::processor::BatchProcessor;
use cdc::store::memory::MemoryConnector;
use cdc::test_utils::profile_created;
use cdc::types::{BatchStatus, EventOutcome};
use config::shared::BatchConfig;

use crate::support::{fast_reconnection, init_test_tracing};

#[tokio::test]
async fn deadline_cutoff_returns_a_partial_retryable_outcome() {
    init_test_tracing();
    let connector = MemoryConnector::new();
    let client = connector.client();
    // Each write outlasts the whole deadline, so only the first event runs.
    client.set_latency(Duration::from_millis(80));

    let batch = BatchConfig {
        max_size: 1000,
        deadline_ms: 40,
    };
    let processor = BatchProcessor::new(connector, batch, fast_reconnection(1));

    let outcome = processor
        .process(vec![
            profile_created("p1", "a@x.com", "1"),
            profile_created("p2", "b@x.com", "2"),
            profile_created("p3", "c@x.com", "3"),
        ])
        .await;

    assert_eq!(outcome.status, BatchStatus::Retry);
    assert!(outcome.should_redeliver());
    // The in-flight write completed; the rest was never started.
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].outcome, EventOutcome::Applied);
    assert_eq!(outcome.unprocessed, 2);
    assert_eq!(client.table_len("users").await, 1);
}

#[tokio::test]
async fn disabled_deadline_processes_slow_batches_fully() {
    init_test_tracing();
    let connector = MemoryConnector::new();
    let client = connector.client();
    client.set_latency(Duration::from_millis(5));

    let batch = BatchConfig {
        max_size: 1000,
        deadline_ms: 0,
    };
    let processor = BatchProcessor::new(connector, batch, fast_reconnection(1));

    let outcome = processor
        .process(vec![
            profile_created("p1", "a@x.com", "1"),
            profile_created("p2", "b@x.com", "2"),
        ])
        .await;

    assert_eq!(outcome.status, BatchStatus::Ok);
    assert_eq!(outcome.applied_count(), 2);
}
