//! Batch processing pipeline.
//!
//! [`BatchProcessor`] drives one delivered batch through its phases: the raw
//! records are normalized, routed and mapped up front, then the planned
//! operations are executed strictly in delivery order against the managed
//! connection. The outcome is always data, never an exception.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use config::shared::{BatchConfig, ReconnectionConfig};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::connection::ConnectionManager;
use crate::executor;
use crate::normalize::{RawChangeRecord, normalize_batch};
use crate::router::Router;
use crate::store::base::TargetConnector;
use crate::types::{
    BatchOutcome, ChangeKind, EventOutcome, EventRecord, FailureReason, SequenceToken,
    TargetOperation,
};

/// Phases of one batch invocation, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchPhase {
    Receiving,
    Normalizing,
    RoutingAndMapping,
    Executing,
    Aggregating,
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchPhase::Receiving => "receiving",
            BatchPhase::Normalizing => "normalizing",
            BatchPhase::RoutingAndMapping => "routing_and_mapping",
            BatchPhase::Executing => "executing",
            BatchPhase::Aggregating => "aggregating",
        };
        f.write_str(name)
    }
}

/// What the planning pass decided for one event.
///
/// Routing and mapping run for the whole batch before any write starts, so a
/// mapping failure late in the batch is known before earlier writes are
/// applied. Events whose outcome is already decided carry it directly.
enum Planned {
    /// A mapped operation to execute, with the ordering-guard coordinates.
    Operation {
        source_entity: String,
        canonical_key: String,
        sequence: SequenceToken,
        operation: TargetOperation,
    },
    /// The outcome is already known without touching the target store.
    Decided(EventOutcome),
}

/// Processes ordered change-record batches against the target store.
///
/// One processor holds the cached target connection and the per-row ordering
/// guard, both of which survive across invocations. Batches must be fed in
/// delivery order; events within a batch are applied strictly sequentially.
pub struct BatchProcessor<C: TargetConnector> {
    connection: ConnectionManager<C>,
    router: Router,
    batch: BatchConfig,
    /// (source entity, canonical source key) → highest applied sequence token.
    last_applied: Mutex<HashMap<(String, String), SequenceToken>>,
}

impl<C: TargetConnector> BatchProcessor<C> {
    /// Creates a processor with the built-in mapper set.
    pub fn new(connector: C, batch: BatchConfig, reconnection: ReconnectionConfig) -> Self {
        Self::with_router(connector, batch, reconnection, Router::with_default_mappers())
    }

    /// Creates a processor with a caller-supplied router.
    pub fn with_router(
        connector: C,
        batch: BatchConfig,
        reconnection: ReconnectionConfig,
        router: Router,
    ) -> Self {
        Self {
            connection: ConnectionManager::new(connector, reconnection),
            router,
            batch,
            last_applied: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the connection manager, mainly for reuse inspection.
    pub fn connection(&self) -> &ConnectionManager<C> {
        &self.connection
    }

    /// Processes one delivered batch and reports the structured outcome.
    ///
    /// Execution follows delivery order. A connectivity-class failure aborts
    /// the remainder of the batch with a retryable verdict; per-event
    /// failures are confined to their event. When connection establishment
    /// itself fails the verdict is fatal and no event is attempted.
    pub async fn process(&self, records: Vec<RawChangeRecord>) -> BatchOutcome {
        let deadline = self.start_deadline();

        debug!(phase = %BatchPhase::Receiving, size = records.len(), "batch received");

        if records.is_empty() {
            return BatchOutcome::aggregate(Vec::new(), 0, false);
        }

        if records.len() > self.batch.max_size {
            warn!(
                size = records.len(),
                max_size = self.batch.max_size,
                "batch exceeds the configured maximum size"
            );
        }

        debug!(phase = %BatchPhase::Normalizing, "normalizing records");
        let events = normalize_batch(&records);

        debug!(phase = %BatchPhase::RoutingAndMapping, "routing and mapping events");
        let planned: Vec<Planned> = events.iter().map(|event| self.plan(event)).collect();

        let has_operations = planned
            .iter()
            .any(|plan| matches!(plan, Planned::Operation { .. }));
        if has_operations {
            if let Err(err) = self.connection.acquire().await {
                warn!(error = %err, "connection establishment failed, batch not attempted");
                return BatchOutcome::fatal(err.to_string(), records.len());
            }
        }

        debug!(phase = %BatchPhase::Executing, "executing operations");
        let (event_records, unprocessed, saw_retryable) =
            self.execute(&events, planned, deadline).await;

        debug!(phase = %BatchPhase::Aggregating, "aggregating outcome");
        let outcome = BatchOutcome::aggregate(event_records, unprocessed, saw_retryable);

        info!(
            status = %outcome.status,
            applied = outcome.applied_count(),
            failed = outcome.failed_count(),
            unprocessed = outcome.unprocessed,
            "batch processed"
        );

        outcome
    }

    /// Decides the plan for one normalized event without touching the store.
    fn plan(&self, event: &crate::types::ChangeEvent) -> Planned {
        if event.kind == ChangeKind::Malformed {
            let detail = event
                .malformed_reason
                .clone()
                .unwrap_or_else(|| "malformed record".to_string());
            return Planned::Decided(EventOutcome::Failed {
                reason: FailureReason::Malformed,
                detail,
            });
        }

        let Some(mapper) = self.router.route(&event.source_entity) else {
            return Planned::Decided(EventOutcome::SkippedUnmapped);
        };

        match mapper.map(event) {
            Ok(operation) => Planned::Operation {
                source_entity: event.source_entity.clone(),
                canonical_key: event.canonical_key(),
                sequence: event.sequence.clone(),
                operation,
            },
            Err(err) => Planned::Decided(EventOutcome::Failed {
                reason: FailureReason::Mapping,
                detail: err.to_string(),
            }),
        }
    }

    async fn execute(
        &self,
        events: &[crate::types::ChangeEvent],
        planned: Vec<Planned>,
        deadline: Option<Instant>,
    ) -> (Vec<EventRecord>, usize, bool) {
        let total = planned.len();
        let mut event_records = Vec::with_capacity(total);
        let mut unprocessed = 0;
        let mut saw_retryable = false;

        for (index, plan) in planned.into_iter().enumerate() {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    unprocessed = total - index;
                    warn!(unprocessed, "batch deadline reached, returning partial outcome");
                    break;
                }
            }

            let source_entity = events[index].source_entity.clone();
            let outcome = match plan {
                Planned::Decided(outcome) => outcome,
                Planned::Operation {
                    source_entity,
                    canonical_key,
                    sequence,
                    operation,
                } => {
                    match self
                        .apply_guarded(source_entity, canonical_key, sequence, &operation)
                        .await
                    {
                        Ok(outcome) => outcome,
                        Err(err) => {
                            // Connectivity failure: the remainder of the
                            // batch, this event included, is redelivered.
                            debug_assert!(err.kind().is_retryable());
                            warn!(
                                index,
                                error = %err,
                                "connectivity failure, aborting the rest of the batch"
                            );
                            saw_retryable = true;
                            unprocessed = total - index;
                            break;
                        }
                    }
                }
            };

            event_records.push(EventRecord {
                index,
                source_entity,
                outcome,
            });
        }

        (event_records, unprocessed, saw_retryable)
    }

    /// Applies one operation behind the per-row ordering guard.
    ///
    /// Returns `Err` only for retryable (connectivity-class) failures, which
    /// abort the batch; everything else is folded into the event outcome.
    async fn apply_guarded(
        &self,
        source_entity: String,
        canonical_key: String,
        sequence: SequenceToken,
        operation: &TargetOperation,
    ) -> Result<EventOutcome, crate::error::CdcError> {
        let guard_key = (source_entity, canonical_key);

        {
            let last_applied = self.last_applied.lock().await;
            if let Some(last) = last_applied.get(&guard_key) {
                // Equal tokens are redeliveries of an applied event; applying
                // them again is an idempotent no-op on the target state.
                if sequence < *last {
                    debug!(
                        entity = %guard_key.0,
                        sequence = %sequence,
                        last = %last,
                        "discarding stale event"
                    );
                    return Ok(EventOutcome::SkippedStale);
                }
            }
        }

        match executor::apply(operation, &self.connection).await {
            Ok(()) => {
                let mut last_applied = self.last_applied.lock().await;
                last_applied.insert(guard_key, sequence);
                Ok(EventOutcome::Applied)
            }
            Err(err) if err.kind().is_retryable() => Err(err),
            Err(err) => Ok(EventOutcome::Failed {
                reason: FailureReason::Constraint,
                detail: err.to_string(),
            }),
        }
    }

    fn start_deadline(&self) -> Option<Instant> {
        if self.batch.deadline_ms == 0 {
            return None;
        }
        Some(Instant::now() + Duration::from_millis(self.batch.deadline_ms))
    }
}
