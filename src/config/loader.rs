//! Configuration loading from disk and the process environment.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Listen port.
pub const ENV_PORT: &str = "PORT";
/// Backend endpoint URL.
pub const ENV_API_URL: &str = "APIURL";
/// Client certificate path.
pub const ENV_CLIENT_CERTIFICATE: &str = "SERVERCERTIFICATE";
/// Client private key path.
pub const ENV_CLIENT_PRIVATE_KEY: &str = "SERVERPRIVATEKEY";
/// CA certificate path.
pub const ENV_CA_CERTIFICATE: &str = "SERVERCRTCERTIFICATE";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, reason: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, reason } => write!(f, "Invalid {}: {}", var, reason),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => GatewayConfig::default(),
    };

    apply_env(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML configuration file without validating it.
pub fn read_config_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay recognized environment variables onto `config`.
///
/// `lookup` resolves a variable name; empty values are ignored.
pub fn apply_env<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    if let Some(port) = get(ENV_PORT) {
        let port: u16 = port.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Env {
            var: ENV_PORT,
            reason: e.to_string(),
        })?;
        config.listener.bind_address = match config.listener.bind_address.parse::<SocketAddr>() {
            Ok(mut addr) => {
                addr.set_port(port);
                addr.to_string()
            }
            Err(_) => format!("0.0.0.0:{}", port),
        };
    }

    if let Some(url) = get(ENV_API_URL) {
        config.upstream.api_url = url;
    }
    if let Some(path) = get(ENV_CLIENT_CERTIFICATE) {
        config.upstream.client_certificate = PathBuf::from(path);
    }
    if let Some(path) = get(ENV_CLIENT_PRIVATE_KEY) {
        config.upstream.client_private_key = PathBuf::from(path);
    }
    if let Some(path) = get(ENV_CA_CERTIFICATE) {
        config.upstream.ca_certificate = PathBuf::from(path);
    }

    Ok(())
}
