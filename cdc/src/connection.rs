use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use config::shared::ReconnectionConfig;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{CdcError, CdcResult};
use crate::store::base::TargetConnector;

/// Jitter applied to every backoff delay to avoid synchronized retries.
const BACKOFF_JITTER_RANGE: std::ops::Range<f64> = 0.8..1.2;

/// Caches one established target store connection across batches.
///
/// [`ConnectionManager::acquire`] hands out the cached client when one is
/// present and otherwise establishes a new connection with bounded
/// exponential backoff. [`ConnectionManager::invalidate`] drops the cached
/// client after a connectivity-class failure so the next acquisition
/// reconnects from scratch.
#[derive(Debug)]
pub struct ConnectionManager<C: TargetConnector> {
    connector: C,
    reconnection: ReconnectionConfig,
    client: Mutex<Option<Arc<C::Client>>>,
    acquires: AtomicU64,
    establishments: AtomicU64,
}

impl<C: TargetConnector> ConnectionManager<C> {
    /// Creates a manager with no cached connection.
    pub fn new(connector: C, reconnection: ReconnectionConfig) -> Self {
        Self {
            connector,
            reconnection,
            client: Mutex::new(None),
            acquires: AtomicU64::new(0),
            establishments: AtomicU64::new(0),
        }
    }

    /// Returns a usable client, reusing the cached connection when present.
    ///
    /// On a cache miss the connection is established through the connector,
    /// retrying up to the configured attempt budget with exponential backoff.
    /// The last establishment error is returned when the budget is exhausted.
    pub async fn acquire(&self) -> CdcResult<Arc<C::Client>> {
        self.acquires.fetch_add(1, Ordering::Relaxed);

        let mut cached = self.client.lock().await;
        if let Some(client) = cached.as_ref() {
            return Ok(client.clone());
        }

        let client = Arc::new(self.establish().await?);
        *cached = Some(client.clone());

        Ok(client)
    }

    /// Drops the cached connection so the next acquisition reconnects.
    ///
    /// Invalidating when no connection is cached is a no-op.
    pub async fn invalidate(&self) {
        let mut cached = self.client.lock().await;
        if cached.take().is_some() {
            info!("invalidated cached target store connection");
        }
    }

    /// Total number of [`acquire`](Self::acquire) calls served.
    pub fn acquire_count(&self) -> u64 {
        self.acquires.load(Ordering::Relaxed)
    }

    /// Total number of connection establishment attempts made.
    pub fn establishment_count(&self) -> u64 {
        self.establishments.load(Ordering::Relaxed)
    }

    async fn establish(&self) -> CdcResult<C::Client> {
        let max_attempts = self.reconnection.max_attempts.max(1);
        let mut delay = self.reconnection.initial_retry_delay();
        let mut last_error: Option<CdcError> = None;

        for attempt in 1..=max_attempts {
            self.establishments.fetch_add(1, Ordering::Relaxed);

            match self.connector.connect().await {
                Ok(client) => {
                    info!(attempt, "established target store connection");
                    return Ok(client);
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts,
                        error = %err,
                        "target store connection attempt failed"
                    );
                    last_error = Some(err);
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(jittered(delay)).await;
                delay = next_delay(delay, &self.reconnection);
            }
        }

        // max_attempts >= 1, so at least one error was recorded.
        Err(last_error.unwrap_or_else(|| {
            CdcError::from((
                crate::error::ErrorKind::ConnectionFailed,
                "target store connection failed",
            ))
        }))
    }
}

fn jittered(delay: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(BACKOFF_JITTER_RANGE);
    delay.mul_f64(factor)
}

fn next_delay(current: Duration, reconnection: &ReconnectionConfig) -> Duration {
    current
        .mul_f64(reconnection.backoff_multiplier)
        .min(reconnection.max_retry_delay())
}
