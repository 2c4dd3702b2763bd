//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the request log storage
//! - Start the metrics exporter when enabled
//! - Build the HTTP server and bind its listener (plain or TLS)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{LogStoreBackend, LogStoreConfig, ProxyConfig};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::tls;
use crate::observability::metrics;
use crate::store::{LogStore, MemoryLogStore, SqliteLogStore, StoreError};

/// Open the configured request log backend.
pub async fn open_log_store(config: &LogStoreConfig) -> Result<Arc<dyn LogStore>, StoreError> {
    match config.backend {
        LogStoreBackend::Sqlite => Ok(Arc::new(SqliteLogStore::open(&config.path).await?)),
        LogStoreBackend::Memory => {
            tracing::warn!("Using in-memory request log; records are lost on restart");
            Ok(Arc::new(MemoryLogStore::new()))
        }
    }
}

/// Run the proxy until `shutdown` fires.
pub async fn run(config: ProxyConfig, shutdown: Shutdown) -> Result<(), Box<dyn Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        log_store = ?config.log_store.backend,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let store = open_log_store(&config.log_store).await?;
    let addr: SocketAddr = config.listener.bind_address.parse()?;
    let tls_config = config.listener.tls.clone();

    let server = HttpServer::new(config, store)?;
    let server_shutdown = shutdown.subscribe();

    match tls_config {
        Some(tls_config) => {
            let rustls = tls::from_config(&tls_config).await?;
            server.run_tls(addr, rustls, server_shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(addr).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, server_shutdown).await?;
        }
    }

    Ok(())
}
