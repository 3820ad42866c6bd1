//! Gateway → HTTPS backend that requires a client certificate.

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

use common::{gateway_config, http_client, start_gateway, start_tls_backend, tls_fixture, TestCa};

fn envelope() -> Value {
    json!({
        "Header": {"SessionID": "s1", "ServiceName": "svc", "RequestTime": "t1"},
        "GetUser": {"id": "42"}
    })
}

async fn call(base_url: &str) -> (StatusCode, Value) {
    let res = http_client()
        .post(format!("{}/RestApi-call", base_url))
        .json(&envelope())
        .send()
        .await
        .expect("Gateway unreachable");
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn test_client_certificate_is_presented() {
    let tls = tls_fixture();
    let backend = start_tls_backend(
        &tls.ca,
        &tls.ca,
        "127.0.0.1",
        200,
        "<GetUser><name>Alice</name></GetUser>",
    )
    .await;
    let gateway = start_gateway(gateway_config(&backend.url, &tls)).await;

    let (status, body) = call(&gateway.base_url).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        body,
        json!({
            "Header": {"SessionID": "s1", "ServiceName": "svc", "RequestTime": "t1"},
            "GetUser": {"name": "Alice"}
        })
    );
    assert_eq!(backend.recorded().len(), 1);
}

#[tokio::test]
async fn test_verified_backend_with_configured_ca() {
    let tls = tls_fixture();
    let backend = start_tls_backend(&tls.ca, &tls.ca, "localhost", 200, "<Ping><ok>yes</ok></Ping>").await;
    let mut config = gateway_config(&backend.url, &tls);
    config.upstream.accept_invalid_certs = false;
    let gateway = start_gateway(config).await;

    let (status, body) = call(&gateway.base_url).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["Ping"], json!({"ok": "yes"}));
}

#[tokio::test]
async fn test_backend_rejecting_client_certificate_is_bad_gateway() {
    let tls = tls_fixture();
    let other_ca = TestCa::new("Unrelated Client CA");
    let backend = start_tls_backend(&tls.ca, &other_ca, "127.0.0.1", 200, "<R/>").await;
    let gateway = start_gateway(gateway_config(&backend.url, &tls)).await;

    let (status, body) = call(&gateway.base_url).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY, "{body}");
    let error = body["error"].as_str().unwrap();
    assert!(
        error == "API service call failed" || error == "Certificate validation failed",
        "{body}"
    );
    assert!(backend.recorded().is_empty());
}

#[tokio::test]
async fn test_untrusted_backend_certificate_is_certificate_failure() {
    let tls = tls_fixture();
    let foreign_ca = TestCa::new("Unrelated Server CA");
    let backend = start_tls_backend(&foreign_ca, &tls.ca, "localhost", 200, "<R/>").await;
    let mut config = gateway_config(&backend.url, &tls);
    config.upstream.accept_invalid_certs = false;
    let gateway = start_gateway(config).await;

    let (status, body) = call(&gateway.base_url).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY, "{body}");
    assert_eq!(body["error"], "Certificate validation failed");
    assert!(body["message"].as_str().unwrap().contains("certificate"), "{body}");
    assert!(backend.recorded().is_empty());
}
