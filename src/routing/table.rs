//! Route lookup.
//!
//! # Responsibilities
//! - Store route entries in declaration order
//! - Resolve (method, path) to the first matching entry plus its bound parameters
//! - Build outbound URLs for a resolved route
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan over entries (the table is tiny)
//! - Explicit RouteNotFound rather than a silent default backend
//! - Templates are validated at construction: an outbound placeholder the inbound
//!   pattern never binds is a startup error, not a per-request one

use axum::http::Method;
use thiserror::Error;
use url::Url;

use crate::config::BackendsConfig;
use crate::routing::pattern::{PathParams, PathPattern, PatternError};

/// Errors raised while building the route table.
#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),

    #[error("outbound template {template:?} uses :{name}, which {inbound:?} does not bind")]
    UnboundPlaceholder {
        inbound: String,
        template: String,
        name: String,
    },

    #[error("invalid backend base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// No entry matches the request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no route for {method} {path}")]
pub struct RouteNotFound {
    pub method: Method,
    pub path: String,
}

/// One row of the route table.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    method: Method,
    inbound: PathPattern,
    backend: String,
    base_url: String,
    outbound: PathPattern,
}

impl RouteEntry {
    /// Bind `method inbound` to `{base_url}{outbound_path}` on the named backend.
    pub fn new(
        method: Method,
        inbound: &str,
        backend: impl Into<String>,
        base_url: &str,
        outbound_path: &str,
    ) -> Result<Self, RouteTableError> {
        let inbound = PathPattern::parse(inbound)?;
        let outbound = PathPattern::parse(outbound_path)?;

        for name in outbound.param_names() {
            if !inbound.param_names().any(|bound| bound == name) {
                return Err(RouteTableError::UnboundPlaceholder {
                    inbound: inbound.as_str().to_string(),
                    template: outbound.as_str().to_string(),
                    name: name.to_string(),
                });
            }
        }

        Ok(Self {
            method,
            inbound,
            backend: backend.into(),
            base_url: normalize_base_url(base_url)?,
            outbound,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn inbound(&self) -> &PathPattern {
        &self.inbound
    }

    /// Backend name, used for logs and metrics labels.
    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The full outbound template, e.g. `http://records:8081/records/:id`.
    pub fn outbound_template(&self) -> String {
        format!("{}{}", self.base_url, self.outbound)
    }
}

/// Validate a backend base URL and strip any trailing slash.
fn normalize_base_url(raw: &str) -> Result<String, RouteTableError> {
    let invalid = |reason: &str| RouteTableError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid("only http backends are supported"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed"));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

/// A matched entry together with the parameters bound from the request path.
#[derive(Debug, Clone)]
pub struct ResolvedRoute<'a> {
    pub entry: &'a RouteEntry,
    pub params: PathParams,
}

impl ResolvedRoute<'_> {
    /// Concrete outbound URL. `query` (without `?`) is appended unchanged.
    pub fn outbound_url(&self, query: Option<&str>) -> Result<String, PatternError> {
        let path = self.entry.outbound.render(&self.params)?;
        Ok(match query {
            Some(q) => format!("{}{}?{}", self.entry.base_url, path, q),
            None => format!("{}{}", self.entry.base_url, path),
        })
    }
}

/// Ordered, immutable route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteEntry>) -> Self {
        Self { routes }
    }

    /// The gateway's route set against the configured backends.
    pub fn gateway(backends: &BackendsConfig) -> Result<Self, RouteTableError> {
        let records = backends.records.base_url();
        let logs = backends.logs.base_url();

        Ok(Self::new(vec![
            RouteEntry::new(Method::GET, "/service", "records", &records, "/records")?,
            RouteEntry::new(Method::GET, "/service/:id", "records", &records, "/records/:id")?,
            RouteEntry::new(Method::POST, "/service", "records", &records, "/records")?,
            RouteEntry::new(Method::PUT, "/service/:id", "records", &records, "/records/:id")?,
            RouteEntry::new(Method::DELETE, "/service/:id", "records", &records, "/records/:id")?,
            RouteEntry::new(Method::GET, "/logs", "logs", &logs, "/logs")?,
        ]))
    }

    /// First entry, in table order, whose method and path both match.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<ResolvedRoute<'_>, RouteNotFound> {
        self.routes
            .iter()
            .filter(|entry| entry.method == *method)
            .find_map(|entry| {
                entry
                    .inbound
                    .match_path(path)
                    .map(|params| ResolvedRoute { entry, params })
            })
            .ok_or_else(|| RouteNotFound {
                method: method.clone(),
                path: path.to_string(),
            })
    }

    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
