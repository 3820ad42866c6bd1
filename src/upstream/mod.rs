//! Backend API subsystem.
//!
//! # Data Flow
//! ```text
//! XmlDocument
//!     → tls.rs (read client cert, key, CA; drop file handles)
//!     → client.rs (POST text/xml over mutual TLS, 10s deadline)
//!     → response body
//!
//! On failure:
//!     error.rs classifies:
//!         HTTP client error naming a certificate → Certificate
//!         other HTTP client error, non-2xx       → Upstream
//!         empty body                             → EmptyResponse
//!         TLS file load failure                  → Internal
//! ```
//!
//! # Design Decisions
//! - Peer verification follows `upstream.accept_invalid_certs` (on by default:
//!   the backend certificate is not verified)
//! - TLS files are re-read per call, so rotation needs no restart

pub mod client;
pub mod error;
pub mod tls;

pub use client::{GatewayClient, SOAP_CONTENT_TYPE};
pub use error::{client_failure, error_chain, FailureClass, MaterialKind, SendError, TlsError};
pub use tls::{TlsMaterial, TlsPaths};
