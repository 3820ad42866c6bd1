//! JSON ⇄ SOAP gateway library.
//!
//! Accepts a JSON `{ header, payload }` envelope over HTTP, forwards the
//! payload as XML to a backend over mutual TLS, and answers with the decoded
//! XML response merged with the original header.

pub mod config;
pub mod convert;
pub mod envelope;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod upstream;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
