//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, status codes valid)
//! - Check that the backend endpoint and TLS material are configured
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("upstream.api_url is not set (APIURL)")]
    MissingApiUrl,

    #[error("upstream.api_url '{url}' is invalid: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("{field} is not set ({env})")]
    MissingPath { field: &'static str, env: &'static str },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("health.status_code {0} is not a valid HTTP status")]
    StatusCode(u16),

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let upstream = &config.upstream;
    if upstream.api_url.trim().is_empty() {
        errors.push(ValidationError::MissingApiUrl);
    } else {
        match url::Url::parse(&upstream.api_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::InvalidApiUrl {
                url: upstream.api_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidApiUrl {
                url: upstream.api_url.clone(),
                reason: e.to_string(),
            }),
        }
    }

    let paths: [(&Path, &'static str, &'static str); 3] = [
        (&upstream.client_certificate, "upstream.client_certificate", "SERVERCERTIFICATE"),
        (&upstream.client_private_key, "upstream.client_private_key", "SERVERPRIVATEKEY"),
        (&upstream.ca_certificate, "upstream.ca_certificate", "SERVERCRTCERTIFICATE"),
    ];
    for (path, field, env) in paths {
        if path.as_os_str().is_empty() {
            errors.push(ValidationError::MissingPath { field, env });
        }
    }

    if upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream.timeout_secs"));
    }
    if config.limits.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("limits.request_timeout_secs"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if !(100..=599).contains(&config.health.status_code) {
        errors.push(ValidationError::StatusCode(config.health.status_code));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
