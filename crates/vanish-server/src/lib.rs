//! Vanish production server.
//!
//! Wraps [`vanish_core`]'s [`SecretService`] in an axum HTTP API, with the
//! system clock and OS randomness from [`SystemEnv`] and either in-memory or
//! Redb storage.
//!
//! # Components
//!
//! - [`http::router`]: routes, CORS and security headers
//! - [`RedbStore`]: durable secret store
//! - [`run_sweeper`]: periodic removal of expired secrets
//! - [`ServerConfig`]: validated settings from flags and `VANISH_*` variables
//! - [`SystemEnv`]: production environment (real time, crypto RNG)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
pub mod http;
pub mod storage;
mod sweeper;
mod system_env;

use std::future::Future;

pub use config::{Args, Backend, HttpConfig, ServerConfig};
pub use error::ServerError;
pub use storage::RedbStore;
pub use sweeper::{run_sweeper, sweep_once};
pub use system_env::SystemEnv;
use tokio::{net::TcpListener, sync::watch};
use vanish_core::{Environment, MemoryStore, SecretService, SecretStore};

/// Open the configured backend and serve until `shutdown` resolves.
///
/// # Errors
///
/// Returns `ServerError` if the backend cannot be opened or the listener
/// cannot be bound.
pub async fn start(
    config: ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let env = SystemEnv::new();
    match config.database {
        Backend::Memory => {
            tracing::warn!("using in-memory storage, secrets are lost on restart");
            serve(config, MemoryStore::new(env), env, shutdown).await
        },
        Backend::Redb => {
            tracing::info!(path = %config.db_path.display(), "opening redb store");
            let store = RedbStore::open(&config.db_path, env)?;
            serve(config, store, env, shutdown).await
        },
    }
}

/// Serve the API over `store` until `shutdown` resolves.
///
/// Also runs the expiry sweeper, which stops once the listener has drained.
///
/// # Errors
///
/// Returns `ServerError` if the policy is invalid or the listener fails.
pub async fn serve<S, E>(
    config: ServerConfig,
    store: S,
    env: E,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError>
where
    S: SecretStore,
    E: Environment,
{
    config.policy.validate()?;

    let service = SecretService::new(store.clone(), env.clone(), config.policy);
    let router = http::router(service, config.http)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let sweeper = tokio::spawn(run_sweeper(store, env, config.sweep_interval, shutdown_rx));

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "vanish server listening");

    axum::serve(listener, router).with_graceful_shutdown(shutdown).await?;

    tracing::info!("shutting down");
    // Fails only if the sweeper already exited.
    let _ = shutdown_tx.send(());
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "expiry sweeper ended abnormally");
    }

    Ok(())
}
