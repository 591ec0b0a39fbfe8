//! Test utilities and common setup.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use filehost::{AppState, Config, routes};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "----filehost-test-boundary";

/// Create a test application serving a fresh temporary root.
///
/// The `TempDir` must be kept alive for as long as the router is used.
pub fn test_app() -> (Router, TempDir) {
    test_app_with_config(Config::default())
}

/// Create a test application with a custom config.
pub fn test_app_with_config(config: Config) -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let state = AppState::with_config(temp_dir.path().to_path_buf(), config);
    (routes::app(state), temp_dir)
}

/// Encode a multipart/form-data body from `(field name, content)` pairs.
pub fn multipart_body(fields: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"upload.bin\"\r\n",
                name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Send one request through the router and collect status and body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
        .await
        .unwrap();
    (status, body.to_vec())
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    send(
        app,
        Request::builder()
            .uri(uri)
            .method(Method::GET)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn upload(app: &Router, uri: &str, content: &[u8]) -> (StatusCode, Vec<u8>) {
    upload_fields(app, uri, &[("file", content)]).await
}

pub async fn upload_fields(
    app: &Router,
    uri: &str,
    fields: &[(&str, &[u8])],
) -> (StatusCode, Vec<u8>) {
    send(
        app,
        Request::builder()
            .uri(uri)
            .method(Method::POST)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields)))
            .unwrap(),
    )
    .await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    send(
        app,
        Request::builder()
            .uri(uri)
            .method(Method::DELETE)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub fn text(body: &[u8]) -> String {
    String::from_utf8(body.to_vec()).unwrap()
}
