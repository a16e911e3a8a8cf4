//! HTTP conversion client for the audio and image endpoints.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::metrics::{CONVERSION_REQUESTS, CONVERSION_REQUEST_DURATION};

use super::config::EndpointConfig;
use super::error::ConversionError;
use super::traits::ConversionClient;
use super::types::{AudioResponse, ErrorBody, FileKind, ImageResponse, RemoteArtifact};

/// Longest error detail kept from a failure body.
const MAX_ERROR_DETAIL_CHARS: usize = 200;

/// Conversion client that POSTs base64 bodies to the configured endpoints.
pub struct HttpConversionClient {
    client: Client,
    config: EndpointConfig,
}

impl HttpConversionClient {
    /// Creates a client for the given endpoints.
    pub fn new(config: EndpointConfig) -> Result<Self, ConversionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConversionError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// The endpoint configuration in use.
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    fn map_send_error(&self, e: reqwest::Error) -> ConversionError {
        if e.is_timeout() {
            ConversionError::transport(format!(
                "request timed out after {}s",
                self.config.timeout_secs
            ))
        } else if e.is_connect() {
            ConversionError::transport(format!("connection failed: {}", e))
        } else {
            ConversionError::transport(e.to_string())
        }
    }

    async fn submit(
        &self,
        kind: FileKind,
        payload: String,
    ) -> Result<RemoteArtifact, ConversionError> {
        let url = self.config.url_for(kind);
        debug!(kind = %kind, url = url, payload_len = payload.len(), "Submitting conversion request");

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/plain")
            .body(payload)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = error_detail(&body);
            warn!(kind = %kind, status = status.as_u16(), detail = ?detail, "Conversion endpoint rejected request");
            return Err(ConversionError::from_status(status.as_u16(), detail));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ConversionError::transport(format!("Failed to read response: {}", e)))?;

        parse_response(kind, &body)
    }
}

/// Parses a success body for the given kind.
pub(crate) fn parse_response(kind: FileKind, body: &[u8]) -> Result<RemoteArtifact, ConversionError> {
    let parsed = match kind {
        FileKind::Audio => serde_json::from_slice::<AudioResponse>(body).map(RemoteArtifact::Audio),
        FileKind::Image => serde_json::from_slice::<ImageResponse>(body).map(RemoteArtifact::Image),
    };
    parsed.map_err(|e| ConversionError::transport(format!("Failed to parse response: {}", e)))
}

/// Extracts a short human-readable detail from a failure body.
fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let detail = match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(parsed) => parsed.error,
        Err(_) => trimmed.to_string(),
    };
    Some(detail.chars().take(MAX_ERROR_DETAIL_CHARS).collect())
}

#[async_trait]
impl ConversionClient for HttpConversionClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn convert(
        &self,
        kind: FileKind,
        payload: String,
    ) -> Result<RemoteArtifact, ConversionError> {
        let start = Instant::now();
        let result = self.submit(kind, payload).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.category().as_str(),
        };
        CONVERSION_REQUESTS
            .with_label_values(&[kind.as_str(), outcome])
            .inc();
        CONVERSION_REQUEST_DURATION
            .with_label_values(&[kind.as_str()])
            .observe(start.elapsed().as_secs_f64());

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ErrorCategory;

    #[test]
    fn test_error_detail_from_json() {
        assert_eq!(
            error_detail(r#"{"error": "No audio data"}"#),
            Some("No audio data".to_string())
        );
    }

    #[test]
    fn test_error_detail_plain_text_and_empty() {
        assert_eq!(error_detail("  bad gateway \n"), Some("bad gateway".to_string()));
        assert_eq!(error_detail("   "), None);
    }

    #[test]
    fn test_error_detail_is_truncated() {
        let long = "x".repeat(1000);
        assert_eq!(error_detail(&long).unwrap().len(), MAX_ERROR_DETAIL_CHARS);
    }

    #[test]
    fn test_parse_response_by_kind() {
        let body = br#"{"image": "/9j/", "width": 1500, "height": 1500}"#;
        let artifact = parse_response(FileKind::Image, body).unwrap();
        assert_eq!(artifact.kind(), FileKind::Image);
    }

    #[test]
    fn test_parse_response_wrong_shape_is_transport_error() {
        let body = br#"{"image": "/9j/"}"#;
        let err = parse_response(FileKind::Audio, body).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::TransportError);
    }

    #[test]
    fn test_parse_response_not_json() {
        let err = parse_response(FileKind::Image, b"<html>").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::TransportError);
    }
}
