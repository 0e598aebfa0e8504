//! Common test utilities for API testing.
//!
//! This module provides a test fixture that creates an in-process router
//! over a temporary storage root, enabling endpoint tests without binding a
//! port.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use bookopt_core::config::{Config, ServerConfig, StorageConfig};
use bookopt_server::{create_router, AppState};

pub const PUBLIC_URL: &str = "http://files.test";
const BOUNDARY: &str = "bookopt-test-boundary";

/// Test fixture for endpoint testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() {
///     let fixture = TestFixture::new();
///     let response = fixture.get("/health").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state behind the router
    pub state: Arc<AppState>,
    /// Temporary storage root
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Raw response from a test request
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl TestFixture {
    /// Create a new test fixture with default limits.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a test fixture, adjusting the config before the router is built.
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config {
            server: ServerConfig {
                public_url: Some(PUBLIC_URL.to_string()),
                ..Default::default()
            },
            storage: StorageConfig {
                root: temp_dir.path().to_path_buf(),
                ..Default::default()
            },
            ..Default::default()
        };
        adjust(&mut config);

        let state = Arc::new(AppState::new(config));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            state,
            temp_dir,
        }
    }

    /// Path of a blob on disk.
    pub fn blob_path(&self, bucket: &str, name: &str) -> PathBuf {
        self.temp_dir.path().join(bucket).join(name)
    }

    /// Write a blob as the external optimizer would.
    pub fn write_blob(&self, bucket: &str, name: &str, data: &[u8]) {
        let path = self.blob_path(bucket, name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, data).unwrap();
    }

    pub fn json_bucket(&self) -> String {
        self.state.store().json_bucket().to_string()
    }

    pub fn optimized_bucket(&self) -> String {
        self.state.store().optimized_bucket().to_string()
    }

    pub fn plotted_bucket(&self) -> String {
        self.state.store().plotted_bucket().to_string()
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_raw(&self, uri: &str) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        RawResponse {
            status,
            content_type,
            bytes,
        }
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// POST a multipart form with one part per `(field, file name, content)`.
    pub async fn post_multipart(&self, uri: &str, parts: &[(&str, &str, &[u8])]) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(parts)))
                .unwrap(),
        )
        .await
    }

    /// Upload one file as field `file`.
    pub async fn upload(&self, file_name: &str, content: &[u8]) -> TestResponse {
        self.post_multipart("/api/upload", &[("file", file_name, content)])
            .await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        TestResponse { status, body }
    }
}

fn multipart_body(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, file_name, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/json\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Split a signed link into `(path and query)` relative to [`PUBLIC_URL`].
pub fn local_path(url: &str) -> &str {
    url.strip_prefix(PUBLIC_URL).expect("link under public url")
}
