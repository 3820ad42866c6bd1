//! Backend call errors and their classification.

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which piece of TLS material an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    ClientCertificate,
    ClientPrivateKey,
    CaCertificate,
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MaterialKind::ClientCertificate => "client certificate",
            MaterialKind::ClientPrivateKey => "client private key",
            MaterialKind::CaCertificate => "CA certificate",
        })
    }
}

/// Errors loading the mutual-TLS material.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {kind} from {}", .path.display())]
    Read {
        kind: MaterialKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed PEM in {kind} file {}", .path.display())]
    Pem {
        kind: MaterialKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} file {} contains no PEM certificate", .path.display())]
    NoCertificate { kind: MaterialKind, path: PathBuf },

    #[error("client private key file {} contains no PEM private key", .path.display())]
    NoPrivateKey { path: PathBuf },

    #[error("{kind} rejected by the HTTP client")]
    Rejected {
        kind: MaterialKind,
        #[source]
        source: reqwest::Error,
    },
}

/// Errors from one backend call.
#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error(transparent)]
    Transport(reqwest::Error),

    #[error("Request failed with status code {status}")]
    Status { status: u16, body: String },

    #[error("Empty response from API service")]
    EmptyResponse,
}

/// How a failed backend call is reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// TLS trust problem; 502.
    Certificate,
    /// The HTTP client reported a failure; 502.
    Upstream,
    /// The call succeeded without a body; 502.
    EmptyResponse,
    /// Anything else; 500.
    Internal,
}

const CERTIFICATE_MARKERS: [&str; 3] = [
    "unable_to_verify_leaf_signature",
    "self_signed_cert_in_chain",
    "certificate",
];

impl SendError {
    /// Classify the failure.
    ///
    /// Only errors raised by the HTTP client are checked for certificate
    /// markers. Failing to load the local TLS files is a configuration
    /// problem and always classifies as `Internal`.
    pub fn classify(&self) -> FailureClass {
        match self {
            SendError::Build(_) | SendError::Transport(_) => client_failure(&error_chain(self)),
            SendError::Status { .. } => FailureClass::Upstream,
            SendError::EmptyResponse => FailureClass::EmptyResponse,
            SendError::Tls(_) => FailureClass::Internal,
        }
    }

    /// Message surfaced to the caller: the backend's body when it sent one,
    /// otherwise the full error chain.
    pub fn detail(&self) -> String {
        match self {
            SendError::Status { body, .. } if !body.trim().is_empty() => body.clone(),
            _ => error_chain(self).join(": "),
        }
    }
}

/// Messages of an error and all of its sources, outermost first.
pub fn error_chain(err: &(dyn StdError + 'static)) -> Vec<String> {
    let mut messages = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if messages.last() != Some(&message) {
            messages.push(message);
        }
        source = cause.source();
    }
    messages
}

/// Class of an HTTP client failure from its error chain.
pub fn client_failure<S: AsRef<str>>(chain: &[S]) -> FailureClass {
    if mentions_certificate(chain) {
        FailureClass::Certificate
    } else {
        FailureClass::Upstream
    }
}

/// Whether any message points at a certificate problem.
pub fn mentions_certificate<S: AsRef<str>>(messages: &[S]) -> bool {
    messages.iter().any(|message| {
        let message = message.as_ref().to_ascii_lowercase();
        CERTIFICATE_MARKERS.iter().any(|marker| message.contains(marker))
    })
}
