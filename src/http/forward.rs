//! Forwarding engine.
//!
//! # Responsibilities
//! - Resolve the route for every inbound request (404 without touching a backend)
//! - Substitute path parameters into the outbound template, keep the query string
//! - Stream the inbound request to the backend and relay its answer verbatim
//! - Translate backend failures into 502/504 for the caller
//! - Dispatch one audit record per forwarded request

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, Uri},
    response::{IntoResponse, Response},
};

use crate::audit::AuditRecord;
use crate::config::AuditPathStyle;
use crate::http::request::{build_outbound, RequestIdExt};
use crate::http::response::{relay, GatewayError};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resilience::{with_timeout, TimeoutError};
use crate::routing::ResolvedRoute;

/// Handler for every inbound request.
pub async fn forward(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Forwarding request"
    );

    let route = match state.routes.resolve(&method, &path) {
        Ok(route) => route,
        Err(e) => {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, "No route matched");
            metrics::record_request(method.as_str(), 404, "none", start_time);
            return GatewayError::from(e).into_response();
        }
    };

    let backend = route.entry.backend().to_string();
    let audit_path = match state.audit_path_style {
        AuditPathStyle::Raw => path.clone(),
        AuditPathStyle::Pattern => route.entry.inbound().as_str().to_string(),
    };

    let response = match proxy(&state, &route, query.as_deref(), request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                backend = %backend,
                error = %e,
                "Upstream error"
            );
            e.into_response()
        }
    };

    let status = response.status();
    metrics::record_request(method.as_str(), status.as_u16(), &backend, start_time);

    tracing::debug!(
        request_id = %request_id,
        backend = %backend,
        status = status.as_u16(),
        elapsed = ?start_time.elapsed(),
        "Request completed"
    );

    state.audit.emit(AuditRecord::new(&method, &audit_path, status));

    response
}

/// One backend exchange: build, send, read fully, relay. Never retried.
async fn proxy(
    state: &AppState,
    route: &ResolvedRoute<'_>,
    query: Option<&str>,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    let url = route.outbound_url(query)?;
    let uri: Uri = url
        .parse()
        .map_err(|e| GatewayError::InvalidOutbound(format!("{url}: {e}")))?;

    let (parts, body) = request.into_parts();
    let outbound = build_outbound(parts.method, &parts.headers, uri, body)?;

    let limit = state.max_response_body_bytes;
    let (parts, bytes) = with_timeout(state.upstream_timeout, async {
        let response = state
            .client
            .request(outbound)
            .await
            .map_err(GatewayError::BackendUnreachable)?;

        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(Body::new(body), limit)
            .await
            .map_err(GatewayError::MalformedUpstreamResponse)?;

        Ok::<_, GatewayError>((parts, bytes))
    })
    .await
    .map_err(flatten_timeout)?;

    Ok(relay(parts, bytes))
}

fn flatten_timeout(err: TimeoutError<GatewayError>) -> GatewayError {
    match err {
        TimeoutError::Elapsed(deadline) => GatewayError::BackendTimeout(deadline),
        TimeoutError::Inner(e) => e,
    }
}
