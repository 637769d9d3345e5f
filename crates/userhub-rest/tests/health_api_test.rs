//! Router-level tests for health and documentation endpoints.

mod common;

use common::{app, broken_app, send};

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_ready_when_dependencies_are_up() {
    let (status, body) = send(&app(), "GET", "/ready", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["components"][0]["name"], "cache");
    assert_eq!(body["components"][0]["status"], "healthy");
}

#[tokio::test]
async fn test_not_ready_when_a_dependency_is_down() {
    let (status, body) = send(&broken_app(), "GET", "/ready", None).await;
    assert_eq!(status, 503);
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["components"][0]["status"], "unhealthy");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (status, body) = send(&app(), "GET", "/api-docs/openapi.json", None).await;
    assert_eq!(status, 200);
    assert!(body["paths"]["/users/{id}"].is_object());
}
