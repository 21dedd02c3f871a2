use std::fmt;

/// Why an event failed, reported in the batch outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The raw record was missing required fields.
    Malformed,
    /// The mapper rejected the event.
    Mapping,
    /// The target store rejected the write with a data or constraint error.
    Constraint,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Malformed => f.write_str("malformed"),
            FailureReason::Mapping => f.write_str("mapping"),
            FailureReason::Constraint => f.write_str("constraint"),
        }
    }
}

/// Per-event result recorded by the batch processor.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// The operation was applied to the target store.
    Applied,
    /// No mapper is registered for the source entity; expected and benign.
    SkippedUnmapped,
    /// The event's sequence token was strictly older than the last applied
    /// one for the same key; discarded by the ordering guard.
    SkippedStale,
    /// The event failed; the failure is confined to this event.
    Failed {
        reason: FailureReason,
        detail: String,
    },
}

impl EventOutcome {
    /// Returns `true` for failed outcomes.
    pub fn is_failed(&self) -> bool {
        matches!(self, EventOutcome::Failed { .. })
    }
}

/// One entry in the batch outcome, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Position of the event within the delivered batch.
    pub index: usize,
    /// Originating entity of the event.
    pub source_entity: String,
    /// What happened to the event.
    pub outcome: EventOutcome,
}

/// Overall verdict of a batch invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every event was applied (or discarded as stale by the ordering guard).
    Ok,
    /// Some events failed or were skipped, but redelivery would not help;
    /// the batch should be acknowledged.
    OkWithWarnings,
    /// A connectivity-class failure or deadline cutoff occurred; the batch
    /// should be redelivered.
    Retry,
    /// Connection establishment failed; no events were processed.
    Fatal,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Ok => f.write_str("ok"),
            BatchStatus::OkWithWarnings => f.write_str("ok-with-warnings"),
            BatchStatus::Retry => f.write_str("retry"),
            BatchStatus::Fatal => f.write_str("fatal"),
        }
    }
}

/// Structured result of one batch invocation.
///
/// The outcome is data, never an exception: per-event errors are captured in
/// [`EventRecord`]s and only the overall status tells the caller whether to
/// acknowledge the batch or request redelivery.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// Overall verdict used for acknowledge/redeliver decisions.
    pub status: BatchStatus,
    /// Per-event results in delivery order, one entry per attempted event.
    pub records: Vec<EventRecord>,
    /// Number of events that were never attempted (deadline cutoff or
    /// connectivity abort); they are part of the redelivered remainder.
    pub unprocessed: usize,
    /// Detail of the establishment failure when the status is
    /// [`BatchStatus::Fatal`].
    pub fatal_detail: Option<String>,
}

impl BatchOutcome {
    /// Builds the outcome for a batch that never started executing because
    /// connection establishment failed.
    pub fn fatal(detail: String, unprocessed: usize) -> Self {
        Self {
            status: BatchStatus::Fatal,
            records: Vec::new(),
            unprocessed,
            fatal_detail: Some(detail),
        }
    }

    /// Aggregates per-event records into an overall verdict.
    ///
    /// A retryable failure or an unprocessed remainder makes the whole batch
    /// retryable; per-event failures and unmapped skips degrade the verdict
    /// to warnings only, since redelivering would fail identically.
    pub fn aggregate(records: Vec<EventRecord>, unprocessed: usize, saw_retryable: bool) -> Self {
        let status = if saw_retryable || unprocessed > 0 {
            BatchStatus::Retry
        } else if records.iter().any(|record| {
            record.outcome.is_failed() || record.outcome == EventOutcome::SkippedUnmapped
        }) {
            BatchStatus::OkWithWarnings
        } else {
            BatchStatus::Ok
        };

        Self {
            status,
            records,
            unprocessed,
            fatal_detail: None,
        }
    }

    /// Returns `true` when the caller should request redelivery.
    pub fn should_redeliver(&self) -> bool {
        matches!(self.status, BatchStatus::Retry | BatchStatus::Fatal)
    }

    /// Number of applied events.
    pub fn applied_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.outcome == EventOutcome::Applied)
            .count()
    }

    /// Number of failed events.
    pub fn failed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.outcome.is_failed())
            .count()
    }
}
