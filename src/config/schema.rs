//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend API endpoint and mutual-TLS material.
    pub upstream: UpstreamConfig,

    /// Health check endpoint behaviour.
    pub health: HealthConfig,

    /// Inbound request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// SOAP endpoint the XML payload is posted to.
    pub api_url: String,

    /// Path to the client certificate (PEM) presented to the backend.
    pub client_certificate: PathBuf,

    /// Path to the client private key (PEM).
    pub client_private_key: PathBuf,

    /// Path to the CA certificate (PEM) added to the trust store.
    pub ca_certificate: PathBuf,

    /// Total time allowed for one backend call, in seconds.
    ///
    /// Defaults to 10. Only tests and unusual deployments should change it.
    pub timeout_secs: u64,

    /// Skip peer certificate verification.
    ///
    /// Defaults to `true`: the backend's certificate is not verified even
    /// though a CA is configured.
    pub accept_invalid_certs: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            client_certificate: PathBuf::new(),
            client_private_key: PathBuf::new(),
            ca_certificate: PathBuf::new(),
            timeout_secs: 10,
            accept_invalid_certs: true,
        }
    }
}

/// Health check endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Status code returned by `GET /` and `GET /statusCheck`.
    pub status_code: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        // Existing load balancers are configured against 400.
        Self { status_code: 400 }
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,

    /// Total time allowed to handle one inbound request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 100 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
