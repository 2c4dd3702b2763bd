//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with management and proxy handlers
//! - Wire up middleware (tracing, body limit, request ID)
//! - Bind server to a plain or TLS listener
//! - Dispatch every unmatched path to the forwarding engine
//! - Observability (metrics, correlation IDs)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderName, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin;
use crate::config::ProxyConfig;
use crate::forward::{Forwarder, SetupError};
use crate::http::request::{into_inbound, request_id, UuidRequestId, X_REQUEST_ID};
use crate::observability::metrics;
use crate::security::limits::body_limit_layer;
use crate::store::{LogStore, RequestLog};

/// Grace period for in-flight requests once shutdown is signalled.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub log: RequestLog,
    /// Route description reported by the health endpoint.
    pub route: Arc<str>,
}

/// HTTP server for the logging proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and log storage.
    pub fn new(config: ProxyConfig, store: Arc<dyn LogStore>) -> Result<Self, SetupError> {
        let log = RequestLog::new(store);
        let timeout = Duration::from_secs(config.timeouts.request_secs);
        let forwarder = Forwarder::new(&config.upstream, timeout, log.clone())?;
        let route = forwarder.targets().describe(&config.listener.bind_address);

        let state = AppState {
            forwarder: Arc::new(forwarder),
            log,
            route: route.into(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .merge(admin::routes())
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(x_request_id.clone(), UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(x_request_id))
                    .layer(body_limit_layer(&config.security)),
            )
    }

    /// Run the server, accepting plain HTTP connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server terminating TLS with `tls` on `addr`.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Catch-all handler: forwards the request upstream.
pub(crate) async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        client = %addr,
        "Received request"
    );

    let response = match into_inbound(request, addr).await {
        Ok(inbound) => match state.forwarder.forward(inbound).await {
            Ok(upstream) => upstream.into_response(),
            Err(e) => {
                tracing::error!(request_id = %request_id, kind = e.kind(), error = %e, "Proxy error");
                metrics::record_upstream_error(e.kind());
                e.into_response()
            }
        },
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read inbound request");
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}
