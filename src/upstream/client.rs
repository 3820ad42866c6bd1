//! Backend API client.
//!
//! # Responsibilities
//! - Load client certificate, private key and CA certificate for each call
//! - POST the XML document over mutual TLS with a fixed deadline
//! - Reject empty and non-2xx answers
//!
//! No retries: a failed call is reported immediately.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::config::UpstreamConfig;
use crate::convert::XmlDocument;
use crate::upstream::error::SendError;
use crate::upstream::tls::{TlsMaterial, TlsPaths};

/// Content type of every backend request.
pub const SOAP_CONTENT_TYPE: &str = "text/xml;charset=UTF-8";

/// Mutual-TLS client for the backend API.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    endpoint: String,
    tls: TlsPaths,
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl GatewayClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            endpoint: config.api_url.clone(),
            tls: TlsPaths::from(config),
            timeout: Duration::from_secs(config.timeout_secs),
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send the document and return the backend's response body.
    pub async fn send(&self, document: &XmlDocument) -> Result<String, SendError> {
        let client = {
            let material = TlsMaterial::load(&self.tls).await?;
            self.build_client(&material)?
        };

        tracing::debug!(soap_endpoint = %self.endpoint, "Sending API Request");

        let response = client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .body(document.as_str().to_owned())
            .send()
            .await
            .map_err(SendError::Transport)?;

        tracing::info!("Certificate validation successful");

        let status = response.status();
        let body = response.text().await.map_err(SendError::Transport)?;

        tracing::debug!(status = status.as_u16(), body = %body, "API Response");

        if !status.is_success() {
            return Err(SendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if body.is_empty() {
            tracing::error!("Empty response from API service");
            return Err(SendError::EmptyResponse);
        }

        Ok(body)
    }

    fn build_client(&self, material: &TlsMaterial) -> Result<reqwest::Client, SendError> {
        reqwest::Client::builder()
            .use_rustls_tls()
            .identity(material.identity()?)
            .add_root_certificate(material.ca_certificate()?)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .timeout(self.timeout)
            .build()
            .map_err(SendError::Build)
    }
}
