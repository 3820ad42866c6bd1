//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment overlay: PORT, APIURL, SERVERCERTIFICATE,
//!       SERVERPRIVATEKEY, SERVERCRTCERTIFICATE (loader.rs)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc with the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - TLS files are only named here; they are read per backend call

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::GatewayConfig;
pub use schema::{HealthConfig, LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig, UpstreamConfig};
