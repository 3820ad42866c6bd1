//! `POST /RestApi-call` pipeline.
//!
//! ```text
//! ReceivedBody → Validated → Encoded → HeaderValidated → Sent → Decoded → Responded
//!       └────────────┴──────────┴─────────────┴──────────┴────────┴──→ ErrorResponded
//! ```
//!
//! Every step waits for the previous one. The header split off the request
//! is carried as a local value to the response; nothing is shared between
//! requests.

use std::fmt;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};
use tracing::Instrument;

use crate::convert;
use crate::envelope::{self, ResponseEnvelope};
use crate::http::form;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::upstream::{error_chain, FailureClass, GatewayClient};

/// Pipeline states of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReceivedBody,
    Validated,
    Encoded,
    HeaderValidated,
    Sent,
    Decoded,
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ReceivedBody => "received_body",
            Stage::Validated => "validated",
            Stage::Encoded => "encoded",
            Stage::HeaderValidated => "header_validated",
            Stage::Sent => "sent",
            Stage::Decoded => "decoded",
            Stage::Responded => "responded",
        })
    }
}

/// A pipeline failure and the stage it happened in.
#[derive(Debug)]
pub struct PipelineError {
    pub stage: Stage,
    pub error: ApiError,
}

impl PipelineError {
    fn at(stage: Stage) -> impl FnOnce(ApiError) -> Self {
        move |error| Self { stage, error }
    }
}

/// Axum handler for the gateway endpoint.
pub async fn rest_api_call(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let span = tracing::info_span!("rest_api_call", request_id = %request_id);
    async move {
        tracing::info!("Incoming Request Received");

        match process(&state.client, &headers, &body).await {
            Ok(envelope) => {
                tracing::info!("Successfully processed API request");
                metrics::record_request("success", StatusCode::OK.as_u16(), start);
                (StatusCode::OK, Json(envelope)).into_response()
            }
            Err(failure) => {
                report(&failure);
                let outcome = failure.error.outcome();
                let response = failure.error.into_response();
                metrics::record_request(outcome, response.status().as_u16(), start);
                response
            }
        }
    }
    .instrument(span)
    .await
}

/// Run the whole pipeline for one request body.
pub async fn process(
    client: &GatewayClient,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<ResponseEnvelope, PipelineError> {
    let request = parse_body(headers, body)
        .ok_or(ApiError::InvalidBody)
        .map_err(PipelineError::at(Stage::ReceivedBody))?;
    enter(Stage::Validated);

    let encoded = convert::encode(&request)
        .map_err(ApiError::from)
        .map_err(PipelineError::at(Stage::Encoded))?;
    enter(Stage::Encoded);

    envelope::validate(&encoded.header)
        .map_err(ApiError::from)
        .map_err(PipelineError::at(Stage::HeaderValidated))?;
    enter(Stage::HeaderValidated);

    let reply = client
        .send(&encoded.document)
        .await
        .map_err(ApiError::from)
        .map_err(PipelineError::at(Stage::Sent))?;
    enter(Stage::Sent);

    let payload = convert::decode(&reply)
        .map_err(ApiError::from)
        .map_err(PipelineError::at(Stage::Decoded))?;
    enter(Stage::Decoded);

    let response = ResponseEnvelope::assemble(encoded.header, payload);
    enter(Stage::Responded);
    Ok(response)
}

fn enter(stage: Stage) {
    tracing::trace!(stage = %stage, "Pipeline stage reached");
}

/// Accept a non-empty object sent as JSON or as a urlencoded form.
fn parse_body(headers: &HeaderMap, body: &[u8]) -> Option<Map<String, Value>> {
    let parsed = match body_kind(headers) {
        Some(BodyKind::Json) => match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) if !map.is_empty() => Some(map),
            _ => None,
        },
        Some(BodyKind::Form) => Some(form::decode_form(body)).filter(|map| !map.is_empty()),
        None => None,
    };
    tracing::debug!(is_valid = parsed.is_some(), "Request Body Valid");
    parsed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())?;
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json")) {
        Some(BodyKind::Json)
    } else if essence == "application/x-www-form-urlencoded" {
        Some(BodyKind::Form)
    } else {
        None
    }
}

fn report(failure: &PipelineError) {
    let stage = failure.stage;
    match &failure.error {
        ApiError::InvalidBody => {
            tracing::warn!(stage = %stage, "Invalid or empty JSON body");
        }
        ApiError::Send(e) => {
            let chain = error_chain(e);
            tracing::error!(stage = %stage, error = %e, chain = ?chain, "Exception caught");
            match e.classify() {
                FailureClass::Certificate => {
                    tracing::error!(error = %e, "Certificate validation failed")
                }
                FailureClass::Upstream => {
                    tracing::error!(error = %e.detail(), "API service call failed")
                }
                FailureClass::EmptyResponse | FailureClass::Internal => {}
            }
        }
        other => {
            let chain = error_chain(other);
            tracing::error!(stage = %stage, error = %other, chain = ?chain, "Exception caught");
        }
    }
}
