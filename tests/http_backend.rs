//! End-to-end checks of the HTTP backend against a mock firewall API.

use std::sync::Arc;
use std::time::Duration;

use phantom_dash::data::{RulesChannel, StatusChannel, ThreatsChannel};
use phantom_dash::{Backend, Dashboard, Endpoint, FetchError, HttpBackend};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STATUS: &str =
    r#"{"status":"active","threats_blocked":12,"rules_active":4,"uptime":3725.8}"#;

async fn serve(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

fn backend_for(server: &MockServer) -> Arc<dyn Backend> {
    Arc::new(HttpBackend::new(&server.uri(), Duration::from_secs(2)).unwrap())
}

#[tokio::test]
async fn test_status_decoded_into_slot() {
    let server = MockServer::start().await;
    serve(&server, "/api/v1/status", ResponseTemplate::new(200).set_body_string(STATUS)).await;

    let channel =
        StatusChannel::new(Endpoint::Status, backend_for(&server), CancellationToken::new());
    let status = channel.refresh().await.unwrap();

    assert_eq!(status.state, "active");
    assert_eq!(status.threats_blocked, 12);
    assert_eq!(status.uptime_seconds, 3725);
    assert_eq!(channel.value().map(|s| s.rules_active), Some(4));
}

#[tokio::test]
async fn test_http_error_is_protocol() {
    let server = MockServer::start().await;
    serve(&server, "/api/v1/rules", ResponseTemplate::new(500)).await;

    let channel =
        RulesChannel::new(Endpoint::Rules, backend_for(&server), CancellationToken::new());
    let err = channel.refresh().await.unwrap_err();

    assert_eq!(err, FetchError::Protocol(500));
    assert!(channel.value().is_none());
    assert_eq!(channel.snapshot().last_error, Some(FetchError::Protocol(500)));
}

#[tokio::test]
async fn test_malformed_body_is_decode() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/api/v1/status",
        ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
    )
    .await;

    let channel =
        StatusChannel::new(Endpoint::Status, backend_for(&server), CancellationToken::new());
    let err = channel.refresh().await.unwrap_err();

    assert!(matches!(err, FetchError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_is_network() {
    // Nothing listens on port 1.
    let backend = HttpBackend::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let err = backend.fetch(Endpoint::Traffic).await.unwrap_err();

    assert!(matches!(err, FetchError::Network(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_timeout_is_network() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/api/v1/status",
        ResponseTemplate::new(200)
            .set_body_string(STATUS)
            .set_delay(Duration::from_millis(500)),
    )
    .await;

    let backend = HttpBackend::new(&server.uri(), Duration::from_millis(50)).unwrap();
    let err = backend.fetch(Endpoint::Status).await.unwrap_err();

    assert!(matches!(err, FetchError::Network(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_threat_feed_object_accepted() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/api/v1/threats",
        ResponseTemplate::new(200)
            .set_body_string(r#"{"malicious_ips":["203.0.113.5"],"last_update":"2024-01-01"}"#),
    )
    .await;

    let channel =
        ThreatsChannel::new(Endpoint::Threats, backend_for(&server), CancellationToken::new());
    let threats = channel.refresh().await.unwrap();

    assert_eq!(threats.len(), 1);
}

#[tokio::test]
async fn test_refresh_all_isolates_failures() {
    let server = MockServer::start().await;
    serve(&server, "/api/v1/status", ResponseTemplate::new(200).set_body_string(STATUS)).await;
    serve(
        &server,
        "/api/v1/rules",
        ResponseTemplate::new(200)
            .set_body_string(r#"[{"id":1,"name":"Block SSH","priority":1,"action":"DROP"}]"#),
    )
    .await;
    serve(&server, "/api/v1/threats", ResponseTemplate::new(200).set_body_string("[]")).await;
    serve(&server, "/api/v1/traffic", ResponseTemplate::new(503)).await;

    let dashboard = Dashboard::new(backend_for(&server), Duration::from_secs(5));
    let state = dashboard.refresh_all().await;

    assert!(state.status.value().is_some());
    assert_eq!(state.rules.value().map(|r| r.len()), Some(1));
    assert_eq!(state.threats.value().map(|t| t.is_empty()), Some(true));
    assert!(state.traffic.value().is_none());

    let export = state.to_export_json();
    assert_eq!(export["errors"]["traffic"], "backend returned HTTP 503");
    assert_eq!(export["rules"][0]["id"], "1");
}
