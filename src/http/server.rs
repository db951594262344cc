//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the forwarding handler as fallback
//! - Wire up middleware (request ID, tracing)
//! - Build the route table, outbound client and audit emitter from config
//! - Serve on a listener until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::audit::{AuditEmitter, AuditError};
use crate::config::{AuditPathStyle, GatewayConfig};
use crate::http::client::{build_client, HttpClient};
use crate::http::forward::forward;
use crate::http::request::UuidRequestId;
use crate::lifecycle::shutdown::ShutdownListener;
use crate::routing::{RouteTable, RouteTableError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub client: HttpClient,
    pub audit: AuditEmitter,
    pub audit_path_style: AuditPathStyle,
    pub upstream_timeout: Duration,
    pub max_response_body_bytes: usize,
}

/// Startup failures of the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid route table: {0}")]
    Routes(#[from] RouteTableError),

    #[error("invalid audit configuration: {0}")]
    Audit(#[from] AuditError),
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    routes: Arc<RouteTable>,
}

impl GatewayServer {
    /// Create a new server with the gateway's route set.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let routes = RouteTable::gateway(&config.backends)?;
        Self::with_routes(config, routes)
    }

    /// Create a server with an explicit route table.
    pub fn with_routes(config: GatewayConfig, routes: RouteTable) -> Result<Self, ServerError> {
        let routes = Arc::new(routes);
        let client = build_client(&config.timeouts);
        let audit = AuditEmitter::new(&config.audit, &config.backends.logs, client.clone())?;

        let state = AppState {
            routes: routes.clone(),
            client,
            audit,
            audit_path_style: config.audit.path_style,
            upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
            max_response_body_bytes: config.limits.max_response_body_bytes,
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            routes,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(forward)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownListener,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.routes.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The fully layered router, for serving elsewhere or driving in-process.
    pub fn into_router(self) -> Router {
        self.router
    }
}
