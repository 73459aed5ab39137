//! # Integration Tests for cm-api
//!
//! Drives the assembled router through `tower::ServiceExt::oneshot`: health
//! probes, the tRPC envelope for single and batched calls, RUT validation
//! outcomes, error mapping, middleware headers, rate limiting, body limits
//! and the OpenAPI document.

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use cm_api::config::AppConfig;
use cm_api::middleware::rate_limit::RateLimitConfig;
use cm_api::state::AppState;

/// Helper: build the test app with default configuration.
fn test_app() -> axum::Router {
    cm_api::app(AppState::default())
}

/// Helper: build the test app with a custom configuration.
fn test_app_with(config: AppConfig) -> axum::Router {
    cm_api::app(AppState::new(config))
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Percent-encode a query value.
fn encode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

fn from_peer(uri: &str, peer: [u8; 4]) -> Request<Body> {
    let mut request = get(uri);
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 40_000))));
    request
}

async fn validate(tax_id: &str) -> (StatusCode, Value) {
    let response = test_app()
        .oneshot(post_json(
            "/api/trpc/integrations.validateTaxId",
            json!({ "taxId": tax_id }),
        ))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

// -- Health -------------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = test_app().oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let response = test_app().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_plain_health() {
    let response = test_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_trpc_health_query() {
    let response = test_app().oneshot(get("/api/trpc/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"]["data"]["status"], "ok");
}

// -- Echo ---------------------------------------------------------------------

#[tokio::test]
async fn test_echo_query() {
    let uri = format!("/api/trpc/echo?input={}", encode(r#"{"message":"hola"}"#));
    let response = test_app().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({ "result": { "data": { "echo": "hola" } } }));
}

#[tokio::test]
async fn test_echo_without_input_is_bad_request() {
    let response = test_app().oneshot(get("/api/trpc/echo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["data"]["code"], "BAD_REQUEST");
    assert_eq!(body["error"]["data"]["path"], "echo");
    assert_eq!(body["error"]["code"], -32600);
}

#[tokio::test]
async fn test_malformed_query_input_is_parse_error() {
    let uri = format!("/api/trpc/echo?input={}", encode("{not json"));
    let response = test_app().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["data"]["code"], "PARSE_ERROR");
    assert_eq!(body["error"]["code"], -32700);
}

// -- validateTaxId ------------------------------------------------------------

#[tokio::test]
async fn test_validate_known_valid_ruts() {
    for rut in ["12345678-5", "12.345.678-5", "123456785", "76086428-5"] {
        let (status, body) = validate(rut).await;
        assert_eq!(status, StatusCode::OK, "{rut}");
        let data = &body["result"]["data"];
        assert_eq!(data["isValid"], true, "{rut}");
        assert!(data["message"].as_str().is_some());
    }
}

#[tokio::test]
async fn test_validate_wrong_check_digit() {
    let (status, body) = validate("12345678-9").await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["result"]["data"];
    assert_eq!(data["isValid"], false);
    assert_eq!(data["normalizedId"], "12345678-9");
}

#[tokio::test]
async fn test_validate_k_check_digit() {
    let (status, body) = validate("12.345.678-k").await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["result"]["data"];
    assert_eq!(data["normalizedId"], "12345678-K");
    assert_eq!(data["isValid"], false);
}

#[tokio::test]
async fn test_validate_format_errors() {
    for rut in ["abc-9", "1", "123456789-0", "12345678-X"] {
        let (status, body) = validate(rut).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{rut}");
        assert_eq!(body["error"]["data"]["code"], "BAD_REQUEST");
        assert_eq!(body["error"]["data"]["path"], "integrations.validateTaxId");
        assert!(body["error"]["message"].as_str().unwrap().contains("invalid RUT"));
    }
}

#[tokio::test]
async fn test_validate_empty_tax_id() {
    let (status, body) = validate("").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "taxId must not be empty");
}

#[tokio::test]
async fn test_validate_missing_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/trpc/integrations.validateTaxId")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validate_malformed_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/trpc/integrations.validateTaxId")
        .header("content-type", "application/json")
        .body(Body::from("{\"taxId\":"))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["data"]["code"], "PARSE_ERROR");
}

// -- Routing errors -----------------------------------------------------------

#[tokio::test]
async fn test_unknown_procedure_is_not_found() {
    let response = test_app().oneshot(get("/api/trpc/services.getVisits")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["data"]["code"], "NOT_FOUND");
    assert_eq!(
        body["error"]["message"],
        "No \"query\"-procedure on path \"services.getVisits\""
    );
}

#[tokio::test]
async fn test_mutation_via_get_is_method_not_supported() {
    let uri = format!(
        "/api/trpc/integrations.validateTaxId?input={}",
        encode(r#"{"taxId":"12345678-5"}"#)
    );
    let response = test_app().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["data"]["code"], "METHOD_NOT_SUPPORTED");
}

#[tokio::test]
async fn test_query_via_post_is_method_not_supported() {
    let response = test_app()
        .oneshot(post_json("/api/trpc/health", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// -- Batching -----------------------------------------------------------------

#[tokio::test]
async fn test_batched_queries_share_status() {
    let input = encode(r#"{"1":{"message":"a"}}"#);
    let uri = format!("/api/trpc/health,echo?batch=1&input={input}");
    let response = test_app().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["result"]["data"]["status"], "ok");
    assert_eq!(items[1]["result"]["data"]["echo"], "a");
}

#[tokio::test]
async fn test_batched_mutations_mixed_outcomes() {
    let response = test_app()
        .oneshot(post_json(
            "/api/trpc/integrations.validateTaxId,integrations.validateTaxId?batch=1",
            json!({ "0": { "taxId": "76086428-5" }, "1": { "taxId": "abc-9" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::MULTI_STATUS);
    let body = body_json(response).await;
    let items = body.as_array().unwrap();
    assert_eq!(items[0]["result"]["data"]["isValid"], true);
    assert_eq!(items[1]["error"]["data"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_batch_input_must_be_object() {
    let response = test_app()
        .oneshot(post_json(
            "/api/trpc/integrations.validateTaxId?batch=1",
            json!([{ "taxId": "76086428-5" }]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["data"]["code"], "BAD_REQUEST");
    assert_eq!(body["error"]["data"]["path"], "integrations.validateTaxId");
}

// -- Middleware ---------------------------------------------------------------

#[tokio::test]
async fn test_security_headers_present() {
    let response = test_app().oneshot(get("/health")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
}

#[tokio::test]
async fn test_cors_allows_configured_origin_with_credentials() {
    let config = AppConfig {
        allowed_origin: Some("https://app.example.cl".parse().unwrap()),
        ..AppConfig::default()
    };
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/trpc/integrations.validateTaxId")
        .header("origin", "https://app.example.cl")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = test_app_with(config).oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(
        headers["access-control-allow-origin"],
        "https://app.example.cl"
    );
    assert_eq!(headers["access-control-allow-credentials"], "true");
}

fn limited(max_requests: u64, trust_proxy: bool) -> AppConfig {
    AppConfig {
        rate_limit: RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
            trust_proxy,
            ..RateLimitConfig::default()
        },
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn test_rate_limit_rejects_after_quota() {
    let app = test_app_with(limited(2, false));

    for _ in 0..2 {
        let response = app.clone().oneshot(from_peer("/health", [192, 0, 2, 1])).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(from_peer("/health", [192, 0, 2, 1])).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    let body = body_json(response).await;
    assert_eq!(body["error"]["data"]["code"], "TOO_MANY_REQUESTS");

    // Probes are not limited.
    let response = app.clone().oneshot(from_peer("/health/liveness", [192, 0, 2, 1])).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Other peers have their own quota.
    let response = app.oneshot(from_peer("/health", [198, 51, 100, 4])).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_ignores_rotating_forwarded_for() {
    let app = test_app_with(limited(2, false));

    let mut statuses = Vec::new();
    for i in 0..10u8 {
        let mut request = from_peer("/health", [192, 0, 2, 1]);
        request.headers_mut().insert(
            "x-forwarded-for",
            format!("203.0.113.{i}").parse().unwrap(),
        );
        statuses.push(app.clone().oneshot(request).await.unwrap().status());
    }

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 2);
    assert!(statuses[2..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_rate_limit_honours_forwarded_for_behind_trusted_proxy() {
    let app = test_app_with(limited(1, true));

    for client in ["203.0.113.1", "203.0.113.2"] {
        let mut request = from_peer("/health", [10, 0, 0, 1]);
        request
            .headers_mut()
            .insert("x-forwarded-for", client.parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{client}");
    }

    let mut request = from_peer("/health", [10, 0, 0, 1]);
    request
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.1".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_body_limit() {
    let config = AppConfig {
        body_limit_bytes: 64,
        ..AppConfig::default()
    };
    let big = "1".repeat(200);
    let response = test_app_with(config)
        .oneshot(post_json(
            "/api/trpc/integrations.validateTaxId",
            json!({ "taxId": big }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["data"]["code"], "PAYLOAD_TOO_LARGE");
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_document() {
    let response = test_app().oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]
        .get("/api/trpc/integrations.validateTaxId")
        .is_some());
}

// -- Static frontend ----------------------------------------------------------

#[tokio::test]
async fn test_static_fallback_serves_index() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>cm</html>").unwrap();

    let config = AppConfig {
        static_dir: Some(dir.path().to_path_buf()),
        ..AppConfig::default()
    };
    let response = test_app_with(config)
        .oneshot(get("/visits"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<html>cm</html>");
}
