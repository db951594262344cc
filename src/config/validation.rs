//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check addresses parse before anything binds or connects
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{BackendConfig, GatewayConfig};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("backends.{0}.host must not be empty")]
    EmptyHost(&'static str),

    #[error("backends.{0}.port must not be 0")]
    ZeroPort(&'static str),

    #[error("{0} must be greater than 0")]
    NotPositive(&'static str),

    #[error("audit.path {0:?} must start with '/'")]
    AuditPath(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Check a loaded configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    check_backend("records", &config.backends.records, &mut errors);
    check_backend("logs", &config.backends.logs, &mut errors);

    let positives = [
        ("timeouts.connect_secs", config.timeouts.connect_secs as u128),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs as u128),
        ("audit.timeout_ms", config.audit.timeout_ms as u128),
        ("audit.max_in_flight", config.audit.max_in_flight as u128),
        ("limits.max_response_body_bytes", config.limits.max_response_body_bytes as u128),
    ];
    for (field, value) in positives {
        if value == 0 {
            errors.push(ValidationError::NotPositive(field));
        }
    }

    if !config.audit.path.starts_with('/') {
        errors.push(ValidationError::AuditPath(config.audit.path.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_backend(name: &'static str, backend: &BackendConfig, errors: &mut Vec<ValidationError>) {
    if backend.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost(name));
    }
    if backend.port == 0 {
        errors.push(ValidationError::ZeroPort(name));
    }
}
