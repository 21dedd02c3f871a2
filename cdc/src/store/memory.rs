use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;

use crate::error::{CdcError, CdcResult, ErrorKind};
use crate::store::base::{TargetClient, TargetConnector};
use crate::types::{Cell, canonical_target_key};
use crate::{bail, cdc_error};

/// A row held by the in-memory target store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    /// Target key columns.
    pub key: Vec<(String, Cell)>,
    /// Non-key columns, replaced wholesale on every upsert.
    pub columns: Vec<(String, Cell)>,
}

/// A declared reference constraint between two in-memory tables.
#[derive(Debug, Clone)]
struct Reference {
    child_table: String,
    child_column: String,
    parent_table: String,
}

#[derive(Debug, Default)]
struct Inner {
    /// table name → canonical key → row.
    tables: HashMap<String, HashMap<String, StoredRow>>,
    /// Scripted failures consumed by the next write operations.
    fail_next: VecDeque<CdcError>,
}

/// In-memory target store for testing and development.
///
/// [`MemoryTargetClient`] keeps the projected rows in memory, enforces
/// declared reference constraints the way a relational store would, and
/// supports scripted failures so tests can exercise the synchronizer's
/// error paths. All data is lost when the process terminates.
#[derive(Debug, Clone, Default)]
pub struct MemoryTargetClient {
    inner: Arc<Mutex<Inner>>,
    references: Arc<std::sync::Mutex<Vec<Reference>>>,
    latency: Arc<std::sync::Mutex<Option<Duration>>>,
}

impl MemoryTargetClient {
    /// Creates a new empty memory target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that `child_table.child_column` must reference an existing
    /// row id in `parent_table`.
    ///
    /// Upserts violating the reference fail with
    /// [`ErrorKind::ConstraintViolation`], mirroring a foreign-key violation
    /// in the relational target.
    pub fn declare_reference(&self, child_table: &str, child_column: &str, parent_table: &str) {
        self.references
            .lock()
            .expect("references lock poisoned")
            .push(Reference {
                child_table: child_table.to_string(),
                child_column: child_column.to_string(),
                parent_table: parent_table.to_string(),
            });
    }

    /// Scripts a failure for the next write operation.
    pub async fn fail_next(&self, error: CdcError) {
        let mut inner = self.inner.lock().await;
        inner.fail_next.push_back(error);
    }

    /// Adds an artificial latency to every write operation.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().expect("latency lock poisoned") = Some(latency);
    }

    /// Returns the row addressed by `key`, if present.
    pub async fn row(&self, table: &str, key: &[(String, Cell)]) -> Option<StoredRow> {
        let inner = self.inner.lock().await;
        inner
            .tables
            .get(table)
            .and_then(|rows| rows.get(&canonical_target_key(key)))
            .cloned()
    }

    /// Returns the number of rows currently stored in `table`.
    pub async fn table_len(&self, table: &str) -> usize {
        let inner = self.inner.lock().await;
        inner.tables.get(table).map(|rows| rows.len()).unwrap_or(0)
    }

    /// Clears all stored rows and scripted failures.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.tables.clear();
        inner.fail_next.clear();
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().expect("latency lock poisoned");
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Checks declared references for an upsert into `table`.
    fn check_references(
        &self,
        inner: &Inner,
        table: &str,
        key: &[(String, Cell)],
        columns: &[(String, Cell)],
    ) -> CdcResult<()> {
        let references = self.references.lock().expect("references lock poisoned");

        for reference in references.iter().filter(|r| r.child_table == table) {
            let referenced = key
                .iter()
                .chain(columns.iter())
                .find(|(name, _)| *name == reference.child_column)
                .map(|(_, value)| value);

            let Some(referenced) = referenced else {
                continue;
            };

            let parent_key = vec![("id".to_string(), referenced.clone())];
            let parent_exists = inner
                .tables
                .get(&reference.parent_table)
                .map(|rows| rows.contains_key(&canonical_target_key(&parent_key)))
                .unwrap_or(false);

            if !parent_exists {
                bail!(
                    ErrorKind::ConstraintViolation,
                    "target store constraint violation",
                    format!(
                        "{}.{} references missing {} row {}",
                        reference.child_table,
                        reference.child_column,
                        reference.parent_table,
                        referenced
                    )
                );
            }
        }

        Ok(())
    }
}

impl TargetClient for MemoryTargetClient {
    async fn upsert(
        &self,
        table: &str,
        key: &[(String, Cell)],
        columns: &[(String, Cell)],
    ) -> CdcResult<()> {
        self.simulate_latency().await;

        let mut inner = self.inner.lock().await;

        if let Some(error) = inner.fail_next.pop_front() {
            return Err(error);
        }

        self.check_references(&inner, table, key, columns)?;

        info!(table, key = %canonical_target_key(key), "upserting row");

        let row = StoredRow {
            key: key.to_vec(),
            columns: columns.to_vec(),
        };
        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(canonical_target_key(key), row);

        Ok(())
    }

    async fn delete(&self, table: &str, key: &[(String, Cell)]) -> CdcResult<()> {
        self.simulate_latency().await;

        let mut inner = self.inner.lock().await;

        if let Some(error) = inner.fail_next.pop_front() {
            return Err(error);
        }

        info!(table, key = %canonical_target_key(key), "deleting row");

        // Idempotent delete: removing an absent row is not an error.
        if let Some(rows) = inner.tables.get_mut(table) {
            rows.remove(&canonical_target_key(key));
        }

        Ok(())
    }
}

/// Connector handing out shared handles to one [`MemoryTargetClient`].
///
/// All connections share the same underlying state, so reconnection after an
/// invalidated handle observes previously written rows, like a real store.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    client: MemoryTargetClient,
    fail_connections: Arc<AtomicU32>,
}

impl MemoryConnector {
    /// Creates a connector with a fresh shared client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared client for direct inspection in tests.
    pub fn client(&self) -> MemoryTargetClient {
        self.client.clone()
    }

    /// Makes the next `count` connection attempts fail.
    pub fn fail_connections(&self, count: u32) {
        self.fail_connections.store(count, Ordering::SeqCst);
    }
}

impl TargetConnector for MemoryConnector {
    type Client = MemoryTargetClient;

    async fn connect(&self) -> CdcResult<MemoryTargetClient> {
        let remaining = self
            .fail_connections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |value| {
                value.checked_sub(1)
            });

        if remaining.is_ok() {
            return Err(cdc_error!(
                ErrorKind::ConnectionFailed,
                "target store connection failed",
                "scripted connection failure"
            ));
        }

        Ok(self.client.clone())
    }
}
