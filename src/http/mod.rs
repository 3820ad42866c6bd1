//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, limits)
//!     → handler.rs (JSON or form body → XML → backend → JSON)
//!         form.rs decodes bracket-nested urlencoded keys
//!     → response.rs (failures → status code + JSON error body)
//!     → Send to client
//!
//! health.rs answers GET / and GET /statusCheck
//! ```

pub mod form;
pub mod handler;
pub mod health;
pub mod response;
pub mod server;

pub use response::ApiError;
pub use server::{AppState, GatewayServer};
