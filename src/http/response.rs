//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the backend response to the caller unchanged
//! - Map gateway failures to HTTP status codes and JSON error bodies
//!
//! # Design Decisions
//! - Status, end-to-end headers and body bytes pass through untouched
//! - Hop-by-hop headers stripped; Content-Length recomputed from the relayed body
//! - Backend timeouts result in 504 Gateway Timeout, other backend failures in 502

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, response, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::http::request::copy_end_to_end_headers;
use crate::routing::{PatternError, RouteNotFound};

/// Failures of a single forwarding call, each mapped to a caller-visible status.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    RouteNotFound(#[from] RouteNotFound),

    #[error("could not build outbound request: {0}")]
    InvalidOutbound(String),

    #[error("backend unreachable: {0}")]
    BackendUnreachable(#[source] hyper_util::client::legacy::Error),

    #[error("backend did not answer within {0:?}")]
    BackendTimeout(Duration),

    #[error("backend response could not be read: {0}")]
    MalformedUpstreamResponse(#[source] axum::Error),
}

impl From<PatternError> for GatewayError {
    fn from(err: PatternError) -> Self {
        GatewayError::InvalidOutbound(err.to_string())
    }
}

impl From<axum::http::Error> for GatewayError {
    fn from(err: axum::http::Error) -> Self {
        GatewayError::InvalidOutbound(err.to_string())
    }
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::BackendTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::InvalidOutbound(_)
            | GatewayError::BackendUnreachable(_)
            | GatewayError::MalformedUpstreamResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable machine-readable kind for the error body.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::RouteNotFound(_) => "route_not_found",
            GatewayError::InvalidOutbound(_) => "invalid_outbound_request",
            GatewayError::BackendUnreachable(_) => "backend_unreachable",
            GatewayError::BackendTimeout(_) => "backend_timeout",
            GatewayError::MalformedUpstreamResponse(_) => "malformed_upstream_response",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        // Backend internals stay in the logs; callers get a generic message.
        let message = match &self {
            GatewayError::RouteNotFound(e) => e.to_string(),
            GatewayError::BackendTimeout(_) => "Upstream request timed out".to_string(),
            _ => "Upstream request failed".to_string(),
        };

        let body = ErrorBody {
            error: self.kind(),
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Rebuild a fully read backend response for the caller.
pub fn relay(parts: response::Parts, body: Bytes) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = parts.status;
    copy_end_to_end_headers(&parts.headers, response.headers_mut(), &[header::CONTENT_LENGTH]);
    response
}
