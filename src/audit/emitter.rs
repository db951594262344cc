//! Fire-and-forget audit delivery.
//!
//! # Responsibilities
//! - POST one JSON record to the log backend per proxied request
//! - Keep the caller's response path independent of the log backend
//! - Bound the work a dead log backend can pile up
//!
//! # Design Decisions
//! - Each record is a detached task; nothing joins it
//! - In-flight deliveries are capped by a semaphore; over the cap, records are dropped
//! - One attempt per record, bounded by a short deadline, never retried
//! - Failures are logged and counted, never propagated

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, uri::InvalidUri, Method, Request, StatusCode, Uri};
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::audit::record::AuditRecord;
use crate::config::{AuditConfig, BackendConfig};
use crate::http::client::HttpClient;
use crate::observability::metrics;
use crate::resilience::{with_timeout, TimeoutError};

/// Reasons a single delivery attempt failed.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("invalid audit endpoint: {0}")]
    Endpoint(#[from] InvalidUri),

    #[error("failed to encode audit record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to build audit request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("audit delivery failed: {0}")]
    Delivery(#[from] hyper_util::client::legacy::Error),

    #[error("log backend answered {0}")]
    Status(StatusCode),

    #[error("audit delivery timed out after {0:?}")]
    Timeout(Duration),
}

impl From<TimeoutError<AuditError>> for AuditError {
    fn from(err: TimeoutError<AuditError>) -> Self {
        match err {
            TimeoutError::Elapsed(d) => AuditError::Timeout(d),
            TimeoutError::Inner(e) => e,
        }
    }
}

struct Inner {
    client: HttpClient,
    endpoint: Uri,
    timeout: Duration,
    in_flight: Arc<Semaphore>,
}

/// Dispatches audit records to the log backend.
///
/// Cheap to clone; clones share the client and the in-flight limit.
#[derive(Clone)]
pub struct AuditEmitter {
    inner: Option<Arc<Inner>>,
}

impl AuditEmitter {
    /// Build an emitter targeting `{logs}{config.path}`.
    pub fn new(
        config: &AuditConfig,
        logs: &BackendConfig,
        client: HttpClient,
    ) -> Result<Self, AuditError> {
        if !config.enabled {
            return Ok(Self::disabled());
        }

        let endpoint: Uri = format!("{}{}", logs.base_url(), config.path).parse()?;
        tracing::debug!(endpoint = %endpoint, "Audit emitter configured");

        Ok(Self {
            inner: Some(Arc::new(Inner {
                client,
                endpoint,
                timeout: Duration::from_millis(config.timeout_ms),
                in_flight: Arc::new(Semaphore::new(config.max_in_flight)),
            })),
        })
    }

    /// An emitter that discards every record.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Launch delivery of `record` in the background and return immediately.
    ///
    /// Returns false when the record was not dispatched (disabled, or too many in flight).
    pub fn emit(&self, record: AuditRecord) -> bool {
        let Some(inner) = self.inner.clone() else {
            return false;
        };

        let permit = match inner.in_flight.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(
                    service = %record.service,
                    message = %record.message,
                    "Audit record dropped: too many deliveries in flight"
                );
                metrics::record_audit("dropped");
                return false;
            }
        };

        tokio::spawn(async move {
            let _permit = permit;
            match deliver(&inner, &record).await {
                Ok(()) => {
                    tracing::trace!(service = %record.service, "Audit record delivered");
                    metrics::record_audit("delivered");
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        service = %record.service,
                        message = %record.message,
                        "Failed to send audit record"
                    );
                    metrics::record_audit("failed");
                }
            }
        });

        true
    }

    /// Make a single delivery attempt and wait for its outcome.
    pub async fn deliver(&self, record: &AuditRecord) -> Result<(), AuditError> {
        match &self.inner {
            Some(inner) => deliver(inner, record).await,
            None => Ok(()),
        }
    }
}

async fn deliver(inner: &Inner, record: &AuditRecord) -> Result<(), AuditError> {
    let req = Request::builder()
        .method(Method::POST)
        .uri(inner.endpoint.clone())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(record.to_json()?))?;

    let status = with_timeout(inner.timeout, async {
        let response = inner.client.request(req).await?;
        Ok::<_, AuditError>(response.status())
    })
    .await?;

    if status.is_success() {
        Ok(())
    } else {
        Err(AuditError::Status(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeoutConfig;
    use crate::http::client::build_client;

    fn emitter(port: u16, config: AuditConfig) -> AuditEmitter {
        AuditEmitter::new(
            &config,
            &BackendConfig::new("127.0.0.1", port),
            build_client(&TimeoutConfig::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_disabled_emitter_discards() {
        let config = AuditConfig {
            enabled: false,
            ..AuditConfig::default()
        };
        let emitter = emitter(9, config);
        assert!(!emitter.is_enabled());
        assert!(!emitter.emit(AuditRecord::new(&Method::GET, "/logs", StatusCode::OK)));
    }

    #[test]
    fn test_invalid_endpoint() {
        let config = AuditConfig {
            path: "/logs with space".into(),
            ..AuditConfig::default()
        };
        let result = AuditEmitter::new(
            &config,
            &BackendConfig::new("127.0.0.1", 9),
            build_client(&TimeoutConfig::default()),
        );
        assert!(matches!(result, Err(AuditError::Endpoint(_))));
    }

    #[tokio::test]
    async fn test_deliver_to_closed_port_fails() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let emitter = emitter(port, AuditConfig::default());
        let record = AuditRecord::new(&Method::GET, "/service", StatusCode::OK);

        let err = emitter.deliver(&record).await.unwrap_err();
        assert!(matches!(err, AuditError::Delivery(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_emit_over_capacity_drops() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        // Accept connections but never answer, so deliveries stay in flight.
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = AuditConfig {
            max_in_flight: 1,
            timeout_ms: 5_000,
            ..AuditConfig::default()
        };
        let emitter = emitter(port, config);
        let record = AuditRecord::new(&Method::GET, "/service", StatusCode::OK);

        assert!(emitter.emit(record.clone()));
        assert!(!emitter.emit(record));
    }
}
