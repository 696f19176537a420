//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use farmerice::config::{AppConfig, Environment};
use farmerice::storage::{self, DocumentStore};
use farmerice::HttpServer;

/// A router over an in-memory database with throwaway static directories.
pub struct TestApp {
    pub server: HttpServer,
    pub store: Arc<dyn DocumentStore>,
    pub root: TempDir,
}

impl TestApp {
    pub fn router(&self) -> Router {
        self.server.router()
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.path().join("uploads")
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.path().join("public")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: Value) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }
}

/// Test configuration rooted in `root`.
pub fn test_config(root: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.environment = Environment::Test;
    config.database.url = "sqlite::memory:".to_string();
    config.static_files.uploads_dir = root.path().join("uploads");
    config.static_files.public_dir = root.path().join("public");
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Build an app after letting the caller adjust the config.
pub async fn spawn_app_with<F>(adjust: F) -> TestApp
where
    F: FnOnce(&mut AppConfig),
{
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::create_dir_all(root.path().join("uploads")).unwrap();
    std::fs::create_dir_all(root.path().join("public")).unwrap();

    let mut config = test_config(&root);
    adjust(&mut config);

    let store = storage::connect(&config.database)
        .await
        .expect("Failed to init DB");
    TestApp {
        server: HttpServer::new(config, store.clone()),
        store,
        root,
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Response is not JSON")
}

/// A `multipart/form-data` upload request with one field per `(name, file name, bytes)`.
pub fn multipart_request(uri: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    let boundary = "farmboundary";
    let mut body = Vec::new();
    for (name, file_name, bytes) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::post(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Every file under `dir`, recursively.
pub fn files_under(dir: &std::path::Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(files_under(&path));
        } else {
            files.push(path);
        }
    }
    files
}
