//! Outbound HTTP client shared by the forwarding engine and the audit emitter.

use std::time::Duration;

use axum::body::Body;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;

/// Pooled HTTP/1.1 client. Cloning shares the pool.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the outbound client with the configured connect timeout.
pub fn build_client(timeouts: &TimeoutConfig) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
    connector.set_nodelay(true);

    Client::builder(TokioExecutor::new()).build(connector)
}
