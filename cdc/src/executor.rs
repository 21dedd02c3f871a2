//! Applies mapped operations to the target store.

use tracing::{debug, warn};

use crate::connection::ConnectionManager;
use crate::error::CdcResult;
use crate::store::base::{TargetClient, TargetConnector};
use crate::types::{OperationKind, TargetOperation, canonical_target_key};

/// Applies one target operation through the managed connection.
///
/// When the write fails with a retryable (connectivity-class) error the
/// cached connection is invalidated before the error propagates, so the next
/// acquisition reconnects instead of reusing a dead handle. Non-retryable
/// failures leave the connection cached; they indicate a problem with the
/// data, not the transport.
pub async fn apply<C: TargetConnector>(
    operation: &TargetOperation,
    manager: &ConnectionManager<C>,
) -> CdcResult<()> {
    let client = manager.acquire().await?;

    debug!(
        table = operation.table,
        kind = %operation.kind,
        key = %canonical_target_key(&operation.key),
        "applying operation"
    );

    let result = match operation.kind {
        OperationKind::Upsert => {
            client
                .upsert(operation.table, &operation.key, &operation.columns)
                .await
        }
        OperationKind::Delete => client.delete(operation.table, &operation.key).await,
    };

    if let Err(err) = result {
        if err.kind().is_retryable() {
            warn!(
                table = operation.table,
                error = %err,
                "connectivity failure, invalidating cached connection"
            );
            manager.invalidate().await;
        }
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::memory::MemoryConnector;
    use crate::types::Cell;
    use crate::cdc_error;
    use config::shared::ReconnectionConfig;

    fn manager() -> (MemoryConnector, ConnectionManager<MemoryConnector>) {
        let connector = MemoryConnector::new();
        let reconnection = ReconnectionConfig {
            max_attempts: 1,
            initial_retry_delay_ms: 1,
            max_retry_delay_ms: 1,
            backoff_multiplier: 1.0,
        };
        (connector.clone(), ConnectionManager::new(connector, reconnection))
    }

    fn upsert_op() -> TargetOperation {
        TargetOperation::upsert(
            "users",
            vec![("id".to_string(), Cell::String("p1".to_string()))],
            vec![("email".to_string(), Cell::String("a@x.com".to_string()))],
        )
    }

    #[tokio::test]
    async fn retryable_failure_invalidates_the_connection() {
        let (connector, manager) = manager();
        manager.acquire().await.unwrap();

        connector
            .client()
            .fail_next(cdc_error!(ErrorKind::ConnectionFailed, "link lost"))
            .await;

        let err = apply(&upsert_op(), &manager).await.unwrap_err();
        assert!(err.kind().is_retryable());

        // The cache was dropped, so the next apply reconnects.
        apply(&upsert_op(), &manager).await.unwrap();
        assert_eq!(manager.establishment_count(), 2);
    }

    #[tokio::test]
    async fn constraint_failure_keeps_the_connection_cached() {
        let (connector, manager) = manager();
        manager.acquire().await.unwrap();

        connector
            .client()
            .fail_next(cdc_error!(ErrorKind::ConstraintViolation, "fk violated"))
            .await;

        let err = apply(&upsert_op(), &manager).await.unwrap_err();
        assert!(!err.kind().is_retryable());

        apply(&upsert_op(), &manager).await.unwrap();
        assert_eq!(manager.establishment_count(), 1);
    }

    #[tokio::test]
    async fn delete_dispatches_by_operation_kind() {
        let (connector, manager) = manager();

        apply(&upsert_op(), &manager).await.unwrap();
        let delete = TargetOperation::delete(
            "users",
            vec![("id".to_string(), Cell::String("p1".to_string()))],
        );
        apply(&delete, &manager).await.unwrap();

        assert_eq!(connector.client().table_len("users").await, 0);
    }
}
