//! Landing, health, and fallback pages.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use sejuk_integration_tests::{TestApp, body_text, location};

#[tokio::test]
async fn test_index_redirects_to_login() {
    let app = TestApp::new();
    let response = app.client().get("/").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_login_page_renders() {
    let app = TestApp::new();
    let response = app.client().get("/login").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("name=\"password\""));
}

#[tokio::test]
async fn test_health_checks() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");

    let response = client.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);

    app.orders.set_failing(true);
    let response = client.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let app = TestApp::new();
    let response = app.client().get("/no/such/page").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Page Not Found"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new();
    let response = app.client().get("/health").await;

    assert!(response.headers().contains_key("x-request-id"));
}
