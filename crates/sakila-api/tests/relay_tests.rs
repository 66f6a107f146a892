//! Integration tests for the relay: routing, pass-through and the error
//! envelope. The answering service is faked with a local axum server.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use sakila_api::create_router;
use sakila_api::error::ErrorBody;
use sakila_api::handlers::HealthResponse;
use sakila_api::state::RelayState;
use sakila_core::config::SakilaConfig;

// =============================================================================
// Helpers
// =============================================================================

/// Serve `router` on an ephemeral loopback port and return the `/ask` URL.
async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/ask", addr)
}

/// An endpoint nothing listens on.
async fn closed_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/ask", addr)
}

fn make_app(endpoint: &str) -> Router {
    let mut config = SakilaConfig::default();
    config.service.endpoint = endpoint.to_string();
    config.service.timeout_secs = 5;
    create_router(RelayState::new(&config).unwrap())
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Upstream that echoes the received body under `received`.
fn echo_upstream() -> Router {
    Router::new().route(
        "/ask",
        post(|Json(body): Json<Value>| async move {
            Json(json!({ "answer": "Forrest Gump, Big", "received": body }))
        }),
    )
}

// =============================================================================
// Pass-through
// =============================================================================

#[tokio::test]
async fn test_relay_returns_upstream_json_verbatim() {
    let upstream = spawn_upstream(echo_upstream()).await;
    let app = make_app(&upstream);

    let resp = app
        .oneshot(post_json(
            "/api/film",
            r#"{"question":"What films star Tom Hanks?"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "answer": "Forrest Gump, Big",
            "received": {"question": "What films star Tom Hanks?"}
        })
    );
}

#[tokio::test]
async fn test_relay_passes_service_errors_through() {
    let upstream = spawn_upstream(Router::new().route(
        "/ask",
        post(|| async { Json(json!({"error": "no such table"})) }),
    ))
    .await;
    let app = make_app(&upstream);

    let resp = app
        .oneshot(post_json("/api/film", r#"{"question":"foo"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body, json!({"error": "no such table"}));
}

// =============================================================================
// Error envelope
// =============================================================================

#[tokio::test]
async fn test_relay_unreachable_upstream_is_500() {
    let app = make_app(&closed_endpoint().await);

    let resp = app
        .oneshot(post_json("/api/film", r#"{"question":"anything"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = body_json(resp).await;
    assert!(!body.error.is_empty());
}

#[tokio::test]
async fn test_relay_upstream_error_status_is_500() {
    let upstream = spawn_upstream(Router::new().route(
        "/ask",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    ))
    .await;
    let app = make_app(&upstream);

    let resp = app
        .oneshot(post_json("/api/film", r#"{"question":"q"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = body_json(resp).await;
    assert_eq!(body.error, "Request failed with status code 503");
}

#[tokio::test]
async fn test_relay_non_json_upstream_is_500() {
    let upstream = spawn_upstream(Router::new().route(
        "/ask",
        post(|| async { "<html>oops</html>" }),
    ))
    .await;
    let app = make_app(&upstream);

    let resp = app
        .oneshot(post_json("/api/film", r#"{"question":"q"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = body_json(resp).await;
    assert!(body.error.starts_with("invalid response from service"));
}

#[tokio::test]
async fn test_relay_bad_body_is_400() {
    let app = make_app(&closed_endpoint().await);

    let resp = app
        .oneshot(post_json("/api/film", r#"{"not_a_question":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(resp).await;
    assert!(!body.error.is_empty());
}

#[tokio::test]
async fn test_relay_rejects_get() {
    let app = make_app(&closed_endpoint().await);
    let resp = app
        .oneshot(Request::get("/api/film").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Health and routing
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = make_app("http://127.0.0.1:8000/ask");
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = body_json(resp).await;
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "0.1.0");
    assert_eq!(health.upstream, "http://127.0.0.1:8000/ask");
}

#[tokio::test]
async fn test_custom_route() {
    let upstream = spawn_upstream(echo_upstream()).await;
    let mut config = SakilaConfig::default();
    config.service.endpoint = upstream;
    config.relay.route = "/chat/ask".to_string();
    let app = create_router(RelayState::new(&config).unwrap());

    let resp = app
        .clone()
        .oneshot(post_json("/chat/ask", r#"{"question":"q"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(post_json("/api/film", r#"{"question":"q"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let app = make_app("http://127.0.0.1:8000/ask");
    let resp = app
        .oneshot(
            Request::get("/health")
                .header("origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
}
