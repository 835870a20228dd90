//! End-to-end tests for remote capabilities
//!
//! Architecture under test:
//!
//! ```text
//! reqwest (test)
//!     │
//!     ▼
//! outer gateway   (every kind remote_http)
//!     │
//!     ▼
//! scripted backend | inner gateway (every kind in_process)
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use apilama_api::{create_router, AppState};
use apilama_tests::{
    local_gateway, remote_dispatcher, remote_gateway, test_monitor, wait_for, TestServer,
};
use axum::extract::Query;
use axum::http::StatusCode as AxumStatus;
use axum::routing::get;
use axum::{Json, Router};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Backend whose `/api/file` answers depend on the requested filename
fn scripted_backend() -> Router {
    async fn read_file(Query(q): Query<HashMap<String, String>>) -> (AxumStatus, Json<Value>) {
        let error = |code, message: &str| {
            (
                code,
                Json(json!({"status": "error", "message": message})),
            )
        };
        match q.get("filename").map(String::as_str).unwrap_or_default() {
            "ok.md" => (
                AxumStatus::OK,
                Json(json!({"status": "success", "name": "ok.md", "content": "remote"})),
            ),
            "missing.md" => error(AxumStatus::NOT_FOUND, "File missing.md not found"),
            "rejected.md" => error(AxumStatus::BAD_REQUEST, "bad filename"),
            "crash.md" => error(AxumStatus::INTERNAL_SERVER_ERROR, "backend crashed"),
            "down.md" => error(AxumStatus::SERVICE_UNAVAILABLE, "disk offline"),
            _ => (AxumStatus::OK, Json(json!({"unexpected": true}))),
        }
    }

    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "ok"})) }))
        .route("/api/file", get(read_file))
}

fn closed_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_remote_status_mapping() {
    let backend = TestServer::start(scripted_backend()).await;
    let gateway = TestServer::start(remote_gateway("outer", &backend.base_url())).await;

    let (status, body) = gateway.get("/api/file?filename=ok.md").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "name": "ok.md", "content": "remote"}));

    let cases = [
        ("missing.md", StatusCode::NOT_FOUND),
        ("rejected.md", StatusCode::BAD_REQUEST),
        // Backend faults are upstream errors, never the gateway's own 500
        ("crash.md", StatusCode::BAD_GATEWAY),
        ("down.md", StatusCode::BAD_GATEWAY),
        ("weird.md", StatusCode::BAD_GATEWAY),
    ];
    for (filename, expected) in cases {
        let (status, body) = gateway
            .get(&format!("/api/file?filename={}", filename))
            .await;
        assert_eq!(status, expected, "{}", filename);
        assert_eq!(body["status"], "error");
    }

    let (_, body) = gateway.get("/api/file?filename=crash.md").await;
    assert_eq!(body["message"], "backend crashed");
}

#[tokio::test]
async fn test_unreachable_backend_is_503() {
    let gateway = TestServer::start(remote_gateway("outer", &closed_endpoint())).await;

    let (status, body) = gateway.get("/api/files?directory=/tmp").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("not available"));

    let (status, body) = gateway.get("/api/files/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["available"], false);
    assert_eq!(body["mode"], "remote_http");

    // Gateway health does not depend on backends
    let (status, _) = gateway.get("/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_gateway_fronting_gateway() {
    let dir = TempDir::new().unwrap();
    let inner = TestServer::start(local_gateway("inner", dir.path())).await;
    let outer = TestServer::start(remote_gateway("outer", &inner.base_url())).await;

    let (status, body) = outer
        .post("/api/file", json!({"path": "a.md", "content": "hi"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"], "a.md");

    let (status, body) = outer.get("/api/file?filename=a.md").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "hi");

    // Same file seen directly on the inner gateway
    let (_, direct) = inner.get("/api/file?filename=a.md").await;
    assert_eq!(direct["content"], "hi");

    let (status, _) = outer.get("/api/file?filename=nope.md").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = outer
        .post("/api/shell/execute", json!({"command": "echo via-proxy"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stdout"], "via-proxy\n");

    let (status, _) = outer.delete("/api/file?filename=a.md").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!dir.path().join("a.md").exists());
}

#[tokio::test]
async fn test_backend_loss_detected_after_ttl() {
    let dir = TempDir::new().unwrap();
    let inner = TestServer::start(local_gateway("inner", dir.path())).await;
    let dispatcher = remote_dispatcher(&inner.base_url(), test_monitor(Duration::from_millis(200)));
    let outer = Arc::new(
        TestServer::start(create_router(AppState::new(Arc::new(dispatcher), "outer"))).await,
    );

    let (status, _) = outer.get("/api/files").await;
    assert_eq!(status, StatusCode::OK);

    let _ = tokio::time::timeout(Duration::from_secs(2), inner.shutdown()).await;

    let detected = wait_for(
        || {
            let outer = outer.clone();
            async move { outer.get("/api/files").await.0 == StatusCode::SERVICE_UNAVAILABLE }
        },
        Duration::from_secs(5),
    )
    .await;
    assert!(detected, "outer gateway never reported the inner one as unavailable");
}
