//! Error responses.
//!
//! # Responsibilities
//! - Map pipeline failures to HTTP status codes
//! - Produce a sanitized `{ "error": ..., "message": ... }` body
//!
//! # Mapping
//! - invalid/empty body → 400
//! - conversion, header validation, XML parse, internal → 500
//! - certificate, upstream, empty response → 502

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::convert::{ConversionError, ParseError};
use crate::envelope::HeaderError;
use crate::upstream::{FailureClass, SendError};

pub const INVALID_BODY: &str = "Invalid or empty JSON body";
pub const CERTIFICATE_FAILED: &str = "Certificate validation failed";
pub const UPSTREAM_FAILED: &str = "API service call failed";
pub const EMPTY_RESPONSE: &str = "Empty response from API service";
pub const INTERNAL_ERROR: &str = "Internal Server Error";

/// Any failure of the `/RestApi-call` pipeline.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid or empty JSON body")]
    InvalidBody,

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Decode(#[from] ParseError),

    #[error(transparent)]
    Send(#[from] SendError),
}

/// JSON body of an error response.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody => StatusCode::BAD_REQUEST,
            ApiError::Conversion(_) | ApiError::Header(_) | ApiError::Decode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Send(e) => match e.classify() {
                FailureClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Short label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            ApiError::InvalidBody => "invalid_body",
            ApiError::Conversion(_) => "conversion_error",
            ApiError::Header(_) => "header_error",
            ApiError::Decode(_) => "parse_error",
            ApiError::Send(e) => match e.classify() {
                FailureClass::Certificate => "certificate_error",
                FailureClass::Upstream => "upstream_error",
                FailureClass::EmptyResponse => "empty_response",
                FailureClass::Internal => "internal_error",
            },
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::InvalidBody => ErrorBody {
                error: INVALID_BODY,
                message: None,
            },
            ApiError::Conversion(_) | ApiError::Header(_) | ApiError::Decode(_) => ErrorBody {
                error: INTERNAL_ERROR,
                message: Some(self.to_string()),
            },
            ApiError::Send(e) => {
                let error = match e.classify() {
                    FailureClass::Certificate => CERTIFICATE_FAILED,
                    FailureClass::Upstream => UPSTREAM_FAILED,
                    FailureClass::EmptyResponse => {
                        return ErrorBody {
                            error: EMPTY_RESPONSE,
                            message: None,
                        }
                    }
                    FailureClass::Internal => INTERNAL_ERROR,
                };
                ErrorBody {
                    error,
                    message: Some(e.detail()),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
