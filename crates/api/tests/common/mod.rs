#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use blobgate_core::engine::PullEngine;
use http_body_util::BodyExt;
use tower::ServiceExt;

use blobgate_api::config::ServerConfig;
use blobgate_api::router::build_app_router;
use blobgate_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        temp_dir: std::env::temp_dir().join("blobgate-tests"),
        store_url: "s3://images/".to_string(),
        product_name: "Blobgate".to_string(),
        engine_command: "unused".to_string(),
    }
}

/// Build the full application router around `engine`.
///
/// Uses the same builder as `main.rs` so tests exercise the production
/// middleware stack.
pub fn build_test_app(engine: impl PullEngine) -> Router {
    build_app_router(AppState::new(test_config(), engine))
}

/// Same as [`build_test_app`] with an explicit config.
pub fn build_test_app_with(config: ServerConfig, engine: impl PullEngine) -> Router {
    build_app_router(AppState::new(config, engine))
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, &[]).await
}

pub async fn post(app: Router, uri: &str, headers: &[(&str, &str)]) -> Response {
    send(app, Method::POST, uri, headers).await
}

async fn send(app: Router, method: Method, uri: &str, headers: &[(&str, &str)]) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect the full response body.
pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Collect the body and split it into its concatenated JSON documents.
pub async fn body_envelopes(response: Response) -> Vec<serde_json::Value> {
    let bytes = body_bytes(response).await;
    serde_json::Deserializer::from_slice(&bytes)
        .into_iter::<serde_json::Value>()
        .collect::<Result<_, _>>()
        .expect("body should be a stream of JSON documents")
}

/// Path for a file inside a fresh temp dir, kept alive by the returned guard.
pub fn scratch_dir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().to_path_buf();
    (dir, path)
}
