use std::sync::Once;

use cdc::processor::BatchProcessor;
use cdc::store::memory::MemoryConnector;
use config::shared::{BatchConfig, ReconnectionConfig};

static TRACING: Once = Once::new();

/// Installs the tracing subscriber once for the whole test binary.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        if let Ok(flusher) = telemetry::init_tracing("cdc-integration-tests") {
            std::mem::forget(flusher);
        }
    });
}

/// Reconnection settings with negligible backoff, keeping tests fast.
pub fn fast_reconnection(max_attempts: u32) -> ReconnectionConfig {
    ReconnectionConfig {
        max_attempts,
        initial_retry_delay_ms: 1,
        max_retry_delay_ms: 2,
        backoff_multiplier: 2.0,
    }
}

/// A processor over the given connector with no batch deadline.
pub fn processor(connector: MemoryConnector) -> BatchProcessor<MemoryConnector> {
    init_test_tracing();

    let batch = BatchConfig {
        max_size: 1000,
        deadline_ms: 0,
    };
    BatchProcessor::new(connector, batch, fast_reconnection(1))
}
