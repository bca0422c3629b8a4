//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the configured store
//! - Start the metrics exporter when enabled
//! - Bind the listener and serve until a signal arrives
//! - Close the store after the server drains

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ServiceConfig, StorageBackend, StorageConfig};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::store::{InMemoryStore, ProxyStore, SqliteStore, StoreError};

/// Errors that stop the service.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open proxy store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Build the store selected by `config`.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn ProxyStore>, StoreError> {
    let store: Arc<dyn ProxyStore> = match config.backend {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(&config.path, config.open_timeout())?),
    };

    tracing::info!(backend = store.kind(), "Proxy store ready");
    Ok(store)
}

/// Run the service until SIGINT/SIGTERM.
pub async fn run(config: ServiceConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let store = open_store(&config.storage)?;

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    tracing::info!(
        address = %listener.local_addr()?,
        backend = store.kind(),
        request_timeout_secs = config.timeouts.request_secs,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, store.clone());
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    let served = server.run(listener, server_shutdown).await;
    let closed = store.close();

    served?;
    closed?;
    Ok(())
}
