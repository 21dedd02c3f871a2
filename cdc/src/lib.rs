//! Change-data-capture synchronizer core.
//!
//! Consumes ordered batches of row-level change records from a source
//! change log, normalizes them into canonical events, routes each event to
//! the mapper for its entity, and applies the mapped operations to a
//! relational target store through a cached connection.
//!
//! The entry point is [`processor::BatchProcessor`]: one processor instance
//! holds the cached connection and the per-row ordering guard across
//! invocations, and [`processor::BatchProcessor::process`] turns one
//! delivered batch into a [`types::BatchOutcome`].

pub mod connection;
pub mod error;
pub mod executor;
pub mod macros;
pub mod mappers;
pub mod normalize;
pub mod processor;
pub mod router;
pub mod store;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
