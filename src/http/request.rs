//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) when the caller sent none
//! - Build the outbound request from the inbound one
//! - Strip hop-by-hop headers; everything else is copied verbatim
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing, and forwarded upstream
//! - The inbound body is moved into the outbound request as a stream, never buffered
//! - `Host` is left to the client, which derives it from the outbound URI

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Access to the correlation ID set by the request-id layer.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

/// Headers that describe a single connection and must not be forwarded.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Copy `source` into `target`, dropping hop-by-hop headers, any header the
/// `Connection` header nominates, and everything listed in `skip`.
pub fn copy_end_to_end_headers(source: &HeaderMap, target: &mut HeaderMap, skip: &[HeaderName]) {
    let nominated: Vec<String> = source
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    for (name, value) in source.iter() {
        if is_hop_by_hop(name)
            || skip.contains(name)
            || nominated.iter().any(|n| n == name.as_str())
        {
            continue;
        }
        target.append(name.clone(), value.clone());
    }
}

/// Build the request sent to the backend: same method, resolved URI, end-to-end
/// headers minus `Host`, and the inbound body untouched.
pub fn build_outbound(
    method: Method,
    headers: &HeaderMap,
    uri: Uri,
    body: Body,
) -> Result<Request<Body>, axum::http::Error> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(target) = builder.headers_mut() {
        copy_end_to_end_headers(headers, target, &[header::HOST]);
    }

    builder.body(body)
}
