//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parseable)
//! - Catch values that would fail later at the transport layer
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ChassisConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ChassisConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem found in the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// listener.bind_address does not parse as host:port.
    #[error("listener.bind_address is not a valid socket address: {0}")]
    InvalidBindAddress(String),

    /// observability.metrics_address does not parse as host:port.
    #[error("observability.metrics_address is not a valid socket address: {0}")]
    InvalidMetricsAddress(String),

    /// service.name is empty and would produce a blank meta.name.
    #[error("service.name must not be empty")]
    EmptyServiceName,

    /// service.version is empty and would produce a blank meta.version.
    #[error("service.version must not be empty")]
    EmptyServiceVersion,

    /// A zero body limit would reject every request with a body.
    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    /// A zero timeout would cancel every request immediately.
    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    /// observability.log_level is not a known level.
    #[error("observability.log_level must be one of trace, debug, info, warn, error (got \"{0}\")")]
    InvalidLogLevel(String),

    /// A CORS value cannot be carried in an HTTP header.
    #[error("cors value is not a valid header value: {0:?}")]
    InvalidCorsValue(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ChassisConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }
    if config.service.version.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceVersion);
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.to_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    for value in config
        .cors
        .allowed_origins
        .iter()
        .chain(&config.cors.allowed_methods)
        .chain(&config.cors.allowed_headers)
    {
        if !is_header_safe(value) {
            errors.push(ValidationError::InvalidCorsValue(value.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Visible ASCII only; anything else cannot form a header value.
fn is_header_safe(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| (0x20..0x7f).contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ChassisConfig::default()).is_ok());
    }

    #[test]
    fn bad_bind_address_is_reported() {
        let mut config = ChassisConfig::default();
        config.listener.bind_address = "not-an-address".to_string();

        let errors = validate_config(&config).unwrap_err();

        assert!(errors.contains(&ValidationError::InvalidBindAddress(
            "not-an-address".to_string()
        )));
    }

    #[test]
    fn all_problems_are_collected_not_just_the_first() {
        let mut config = ChassisConfig::default();
        config.listener.bind_address = "nope".to_string();
        config.service.name = "  ".to_string();
        config.limits.max_body_bytes = 0;
        config.timeouts.request_secs = 0;
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();

        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = ChassisConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "nope".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn control_characters_in_cors_values_are_rejected() {
        let mut config = ChassisConfig::default();
        config.cors.allowed_origins = vec!["https://ok.example".to_string(), "bad\nvalue".to_string()];

        let errors = validate_config(&config).unwrap_err();

        assert_eq!(
            errors,
            vec![ValidationError::InvalidCorsValue("bad\nvalue".to_string())]
        );
    }
}
