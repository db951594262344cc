//! Configuration loading from disk and environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Listener port.
pub const ENV_SERVICE_PORT: &str = "SERVICE_PORT";
pub const ENV_RECORDS_HOST: &str = "RECORDS_SERVICE_HOST";
pub const ENV_RECORDS_PORT: &str = "RECORDS_SERVICE_PORT";
pub const ENV_LOG_HOST: &str = "LOG_SERVICE_HOST";
pub const ENV_LOG_PORT: &str = "LOG_SERVICE_PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment variable {name}={value:?}: expected a port number")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: TOML file (if any), then process environment, then validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => GatewayConfig::default(),
    };

    let config = apply_env_overrides(config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Deserialize a TOML document. Missing sections fall back to defaults.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Apply the deployment environment variables on top of `config`.
///
/// `lookup` abstracts the environment so callers (and tests) can supply their own.
pub fn apply_env_overrides<F>(mut config: GatewayConfig, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup_port(&lookup, ENV_SERVICE_PORT)? {
        config.listener.bind_address = match config.listener.bind_address.parse::<SocketAddr>() {
            Ok(mut addr) => {
                addr.set_port(port);
                addr.to_string()
            }
            Err(_) => format!("0.0.0.0:{}", port),
        };
    }

    if let Some(host) = lookup(ENV_RECORDS_HOST).filter(|h| !h.is_empty()) {
        config.backends.records.host = host;
    }
    if let Some(port) = lookup_port(&lookup, ENV_RECORDS_PORT)? {
        config.backends.records.port = port;
    }

    if let Some(host) = lookup(ENV_LOG_HOST).filter(|h| !h.is_empty()) {
        config.backends.logs.host = host;
    }
    if let Some(port) = lookup_port(&lookup, ENV_LOG_PORT)? {
        config.backends.logs.port = port;
    }

    Ok(config)
}

fn lookup_port<F>(lookup: &F, name: &'static str) -> Result<Option<u16>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) if value.is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{AuditPathStyle, LogFormat};
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [backends.records]
            host = "records.internal"
            port = 9001

            [audit]
            path_style = "pattern"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.backends.records.base_url(), "http://records.internal:9001");
        assert_eq!(config.backends.logs, GatewayConfig::default().backends.logs);
        assert_eq!(config.audit.path_style, AuditPathStyle::Pattern);
        assert_eq!(config.audit.path, "/logs");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.timeouts.upstream_secs, 30);
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        assert!(matches!(
            parse_config("[listener\nbind_address = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = apply_env_overrides(
            GatewayConfig::default(),
            env(&[
                ("SERVICE_PORT", "9000"),
                ("RECORDS_SERVICE_HOST", "records"),
                ("RECORDS_SERVICE_PORT", "7001"),
                ("LOG_SERVICE_HOST", "logs"),
                ("LOG_SERVICE_PORT", "7002"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert_eq!(config.backends.records.base_url(), "http://records:7001");
        assert_eq!(config.backends.logs.base_url(), "http://logs:7002");
    }

    #[test]
    fn test_env_override_keeps_listener_host() {
        let mut base = GatewayConfig::default();
        base.listener.bind_address = "127.0.0.1:8080".into();

        let config = apply_env_overrides(base, env(&[("SERVICE_PORT", "8181")])).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8181");
    }

    #[test]
    fn test_env_empty_values_are_ignored() {
        let config = apply_env_overrides(
            GatewayConfig::default(),
            env(&[("RECORDS_SERVICE_HOST", ""), ("LOG_SERVICE_PORT", "")]),
        )
        .unwrap();
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn test_env_invalid_port() {
        let err = apply_env_overrides(
            GatewayConfig::default(),
            env(&[("RECORDS_SERVICE_PORT", "eighty")]),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidEnv { name: "RECORDS_SERVICE_PORT", .. }
        ));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::Validation(vec![
            ValidationError::NotPositive("audit.timeout_ms"),
            ValidationError::ZeroPort("logs"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: audit.timeout_ms must be greater than 0, backends.logs.port must not be 0"
        );
    }
}
