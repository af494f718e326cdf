//! Periodic removal of expired secrets.
//!
//! Stores enforce expiry on read, so sweeping only reclaims space. A failed
//! sweep is logged and retried on the next tick.

use std::time::Duration;

use tokio::sync::watch;
use vanish_core::{Environment, SecretStore, StoreError};

/// Run one purge on the blocking pool.
///
/// # Errors
///
/// Returns the store's error, or `StoreError::Io` if the blocking task
/// panicked.
pub async fn sweep_once<S: SecretStore>(store: &S) -> Result<usize, StoreError> {
    let store = store.clone();
    tokio::task::spawn_blocking(move || store.purge_expired())
        .await
        .map_err(|e| StoreError::Io(format!("sweeper task failed: {e}")))?
}

/// Purge expired secrets every `interval` until `shutdown` changes.
///
/// `env` only provides the sleep; the store keeps its own clock.
pub async fn run_sweeper<S, E>(
    store: S,
    env: E,
    interval: Duration,
    mut shutdown: watch::Receiver<()>,
) where
    S: SecretStore,
    E: Environment,
{
    tracing::debug!(interval_secs = interval.as_secs(), "expiry sweeper started");

    loop {
        tokio::select! {
            () = env.sleep(interval) => {},
            _ = shutdown.changed() => break,
        }

        match sweep_once(&store).await {
            Ok(0) => {},
            Ok(purged) => tracing::info!(purged, "purged expired secrets"),
            Err(e) => tracing::warn!(error = %e, "expiry sweep failed"),
        }
    }

    tracing::debug!("expiry sweeper stopped");
}
