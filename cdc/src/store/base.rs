use std::future::Future;

use crate::error::CdcResult;
use crate::types::Cell;

/// Trait for relational stores that receive synchronized data.
///
/// [`TargetClient`] implementations define how mapped operations are written
/// to the target schema. Both operations are idempotent by contract: the
/// synchronizer may retry batches after partial failures, so applying the
/// same operation twice must leave the target row identical to applying it
/// once, and deleting an absent row must succeed.
///
/// Error classification matters here: connectivity-class failures must
/// surface with a retryable [`crate::error::ErrorKind`] so the connection
/// manager can invalidate the handle, while data and constraint failures
/// must stay confined to the failing operation.
pub trait TargetClient: Send + Sync + 'static {
    /// Inserts or replaces the row addressed by `key` in `table`.
    fn upsert(
        &self,
        table: &str,
        key: &[(String, Cell)],
        columns: &[(String, Cell)],
    ) -> impl Future<Output = CdcResult<()>> + Send;

    /// Deletes the row addressed by `key` in `table`.
    ///
    /// Deleting a non-existent row is not an error.
    fn delete(
        &self,
        table: &str,
        key: &[(String, Cell)],
    ) -> impl Future<Output = CdcResult<()>> + Send;
}

/// Trait for establishing target store connections.
///
/// Only the connection manager calls [`TargetConnector::connect`]; the rest
/// of the synchronizer works against the cached [`TargetClient`] handle.
pub trait TargetConnector: Send + Sync + 'static {
    /// The client type produced by this connector.
    type Client: TargetClient;

    /// Establishes a new connection to the target store.
    fn connect(&self) -> impl Future<Output = CdcResult<Self::Client>> + Send;
}
