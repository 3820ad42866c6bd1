//! Middleware header extraction and validation.

use serde_json::Value;
use thiserror::Error;

/// Fields every request header must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["SessionID", "ServiceName", "RequestTime"];

/// The reserved first field of a request envelope.
///
/// Held for the duration of one request and reattached to its response
/// under the same key.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    key: String,
    value: Value,
}

impl Header {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Key the header was sent under.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Look up a field; non-object headers have no fields.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.value.as_object().and_then(|fields| fields.get(name))
    }

    pub fn into_parts(self) -> (String, Value) {
        (self.key, self.value)
    }
}

/// Header validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("Missing required MW_HEADER fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// Check that every required field is present and set.
///
/// All missing fields are reported together, in declaration order.
pub fn validate(header: &Header) -> Result<(), HeaderError> {
    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !is_set(header.field(field)))
        .collect();

    if !missing.is_empty() {
        tracing::error!(missing_fields = ?missing, "Missing required MW_HEADER fields");
        return Err(HeaderError::MissingFields(missing));
    }

    tracing::debug!("MW_HEADER validation passed");
    Ok(())
}

/// Absent, null, empty, `false` and zero values count as unset.
fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
