//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock conversion client injected, enabling E2E testing without
//! the remote conversion endpoints.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use releasekit_core::{
    config::{ExportConfig, ServerConfig},
    testing::MockConversionClient,
    BatchConfig, Config, ConversionClient, EndpointConfig,
};

/// Re-export fixtures for test convenience
pub use releasekit_core::testing::fixtures;

const BOUNDARY: &str = "releasekit-test-boundary";

/// Test fixture for E2E testing with a mock conversion client.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_batch_creation() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture
///         .upload("/api/v1/batches", &[UploadPart::new("track.mp3", "audio/mpeg", b"...")])
///         .await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock conversion client - script endpoint outcomes
    pub client: MockConversionClient,
    /// Temporary directory holding the export directory
    pub temp_dir: TempDir,
    /// Configured export directory
    pub export_dir: PathBuf,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub raw: Vec<u8>,
}

/// One file part of a multipart upload.
pub struct UploadPart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadPart {
    pub fn new(file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.to_vec(),
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default batch settings.
    pub async fn new() -> Self {
        Self::with_batch_config(BatchConfig::default()).await
    }

    /// Create a test fixture with custom batch settings.
    pub async fn with_batch_config(batch: BatchConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let export_dir = temp_dir.path().join("exports");

        let client = MockConversionClient::new();

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
                max_upload_mb: 64,
            },
            endpoints: EndpointConfig::new("http://mock/audio", "http://mock/image"),
            batch,
            export: ExportConfig {
                dir: export_dir.clone(),
            },
        };

        let ws_broadcaster = releasekit_server::api::WsBroadcaster::default();

        // Create app state with the mock client
        let state = Arc::new(releasekit_server::state::AppState::new(
            config,
            Arc::new(client.clone()) as Arc<dyn ConversionClient>,
            ws_broadcaster,
        ));

        // Create router
        let router = releasekit_server::api::create_router(state);

        Self {
            router,
            client,
            temp_dir,
            export_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, Body::empty(), None).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path, Body::empty(), None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, Body::empty(), None).await
    }

    /// Send a multipart upload with the given file parts.
    pub async fn upload(&self, path: &str, parts: &[UploadPart]) -> TestResponse {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                    part.file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
            body.extend_from_slice(&part.bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        self.request("POST", path, Body::from(body), Some(&content_type))
            .await
    }

    /// Create a batch from parts and return its id.
    pub async fn create_batch(&self, parts: &[UploadPart]) -> String {
        let response = self.upload("/api/v1/batches", parts).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"]
            .as_str()
            .expect("Batch id missing")
            .to_string()
    }

    /// Poll a batch until every file is terminal.
    pub async fn wait_for_batch(&self, id: &str) -> TestResponse {
        for _ in 0..200 {
            let response = self.get(&format!("/api/v1/batches/{}", id)).await;
            if response.body["summary"]["finished"] == true {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Batch {} did not finish in time", id);
    }

    /// Send a request to the test server.
    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Body,
        content_type: Option<&str>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        if let Some(content_type) = content_type {
            request_builder = request_builder.header("Content-Type", content_type);
        }
        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            raw: body_bytes.to_vec(),
        }
    }
}
