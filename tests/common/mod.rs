//! Shared utilities for gateway integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, Issuer, KeyPair,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use soap_gateway::config::GatewayConfig;
use soap_gateway::http::GatewayServer;
use soap_gateway::lifecycle::Shutdown;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A throwaway certificate authority.
pub struct TestCa {
    issuer: Issuer<'static, KeyPair>,
    pub pem: String,
    pub der: CertificateDer<'static>,
}

/// A certificate and its PKCS#8 key, both PEM and DER.
pub struct IssuedCert {
    pub cert_pem: String,
    pub key_pem: String,
    pub cert_der: CertificateDer<'static>,
    pub key_der: Vec<u8>,
}

impl TestCa {
    pub fn new(common_name: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.distinguished_name = distinguished_name(common_name);
        let cert = params.self_signed(&key).unwrap();
        Self {
            pem: cert.pem(),
            der: cert.der().clone(),
            issuer: Issuer::new(params, key),
        }
    }

    pub fn issue_client(&self) -> IssuedCert {
        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name("Gateway Test Client");
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ClientAuth];
        self.issue(params)
    }

    pub fn issue_server(&self) -> IssuedCert {
        let mut params =
            CertificateParams::new(vec!["localhost".to_string(), "127.0.0.1".to_string()]).unwrap();
        params.distinguished_name = distinguished_name("Gateway Test Backend");
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        self.issue(params)
    }

    fn issue(&self, mut params: CertificateParams) -> IssuedCert {
        params.is_ca = IsCa::NoCa;
        let key = KeyPair::generate().unwrap();
        let cert = params.signed_by(&key, &self.issuer).unwrap();
        IssuedCert {
            cert_pem: cert.pem(),
            key_pem: key.serialize_pem(),
            cert_der: cert.der().clone(),
            key_der: key.serialize_der(),
        }
    }
}

fn distinguished_name(common_name: &str) -> DistinguishedName {
    let mut name = DistinguishedName::new();
    name.push(DnType::CommonName, common_name);
    name
}

/// Client certificate, key and CA written to a temporary directory.
pub struct TlsFixture {
    _dir: TempDir,
    pub ca: TestCa,
    pub certificate: PathBuf,
    pub private_key: PathBuf,
    pub ca_certificate: PathBuf,
}

pub fn tls_fixture() -> TlsFixture {
    let dir = tempfile::Builder::new().prefix("gw-tls").tempdir().unwrap();
    let ca = TestCa::new("Gateway Test CA");
    let client = ca.issue_client();

    let certificate = dir.path().join("client.crt");
    let private_key = dir.path().join("client.key");
    let ca_certificate = dir.path().join("ca.crt");
    std::fs::write(&certificate, &client.cert_pem).unwrap();
    std::fs::write(&private_key, &client.key_pem).unwrap();
    std::fs::write(&ca_certificate, &ca.pem).unwrap();

    TlsFixture {
        _dir: dir,
        ca,
        certificate,
        private_key,
        ca_certificate,
    }
}

/// A request seen by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub content_type: Option<String>,
    pub body: String,
}

pub struct MockBackend {
    pub url: String,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn recording_router(status: u16, body: &str, requests: Arc<Mutex<Vec<RecordedRequest>>>) -> Router {
    let reply = body.to_string();
    let status = StatusCode::from_u16(status).unwrap();

    Router::new().route(
        "/soap",
        post(move |headers: HeaderMap, body: String| {
            let recorded = requests.clone();
            let reply = reply.clone();
            async move {
                recorded.lock().unwrap().push(RecordedRequest {
                    content_type: headers
                        .get(CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    body,
                });
                (status, reply)
            }
        }),
    )
}

/// Start a backend that answers every POST /soap with `status` and `body`.
pub async fn start_backend(status: u16, body: &str) -> MockBackend {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let app = recording_router(status, body, requests.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend {
        url: format!("http://{}/soap", addr),
        requests,
    }
}

/// Start an HTTPS backend presenting a certificate from `server_ca` and
/// requiring a client certificate issued by `client_ca`.
///
/// `host` names the backend in the returned URL (`127.0.0.1` or `localhost`).
pub async fn start_tls_backend(
    server_ca: &TestCa,
    client_ca: &TestCa,
    host: &str,
    status: u16,
    body: &str,
) -> MockBackend {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let server = server_ca.issue_server();
    let mut roots = RootCertStore::empty();
    roots.add(client_ca.der.clone()).unwrap();
    let verifier = WebPkiClientVerifier::builder(Arc::new(roots)).build().unwrap();
    let config = ServerConfig::builder()
        .with_client_cert_verifier(verifier)
        .with_single_cert(
            vec![server.cert_der],
            PrivateKeyDer::from(PrivatePkcs8KeyDer::from(server.key_der)),
        )
        .unwrap();

    let requests = Arc::new(Mutex::new(Vec::new()));
    let app = recording_router(status, body, requests.clone());

    let handle = axum_server::Handle::new();
    let server = axum_server::bind_rustls(
        SocketAddr::from(([127, 0, 0, 1], 0)),
        RustlsConfig::from_config(Arc::new(config)),
    )
    .handle(handle.clone());
    tokio::spawn(async move {
        let _ = server.serve(app.into_make_service()).await;
    });
    let addr = handle.listening().await.expect("TLS backend did not start");

    MockBackend {
        url: format!("https://{}:{}/soap", host, addr.port()),
        requests,
    }
}

/// An address nothing listens on.
pub async fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/soap", addr)
}

pub fn gateway_config(api_url: &str, tls: &TlsFixture) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.api_url = api_url.into();
    config.upstream.client_certificate = tls.certificate.clone();
    config.upstream.client_private_key = tls.private_key.clone();
    config.upstream.ca_certificate = tls.ca_certificate.clone();
    config.upstream.timeout_secs = 5;
    config
}

/// A running gateway; dropping it shuts the server down.
pub struct RunningGateway {
    pub base_url: String,
    _shutdown: Shutdown,
}

pub async fn start_gateway(config: GatewayConfig) -> RunningGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let server = GatewayServer::new(config);

    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    RunningGateway {
        base_url: format!("http://{}", addr),
        _shutdown: shutdown,
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .no_proxy()
        .build()
        .unwrap()
}
