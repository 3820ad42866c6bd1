//! Request and response envelopes.
//!
//! # Data Flow
//! ```text
//! { "<header key>": {...}, "<root tag>": {...} }      request body
//!     → convert::encode splits off the Header
//!     → header.rs validates SessionID / ServiceName / RequestTime
//!     ...backend call...
//!     → ResponseEnvelope { "<header key>": {...}, <decoded XML fields> }
//! ```
//!
//! # Design Decisions
//! - The header travels with the request as a value, never as shared state
//! - The response reuses the key the caller sent the header under

pub mod header;

use serde::Serialize;
use serde_json::{Map, Value};

pub use header::{validate, Header, HeaderError, REQUIRED_FIELDS};

/// JSON answer returned to the caller on success.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResponseEnvelope(Map<String, Value>);

impl ResponseEnvelope {
    /// Put the header first, followed by the decoded payload fields.
    ///
    /// A payload field with the header's key replaces the header value but
    /// keeps the first position.
    pub fn assemble(header: Header, payload: Map<String, Value>) -> Self {
        let (key, value) = header.into_parts();
        let mut fields = Map::with_capacity(payload.len() + 1);
        fields.insert(key, value);
        for (k, v) in payload {
            fields.insert(k, v);
        }
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
