//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConversionError;
use super::types::{FileKind, RemoteArtifact};

/// A client for the remote conversion endpoints.
///
/// One call submits one encoded file and waits for the structured result.
/// Implementations never retry; retry policy belongs to the caller.
#[async_trait]
pub trait ConversionClient: Send + Sync {
    /// Returns the name of this client implementation.
    fn name(&self) -> &str;

    /// Submits a transport-encoded payload to the endpoint for `kind`.
    async fn convert(
        &self,
        kind: FileKind,
        payload: String,
    ) -> Result<RemoteArtifact, ConversionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{AudioResponse, ImageResponse};

    struct EchoClient;

    #[async_trait]
    impl ConversionClient for EchoClient {
        fn name(&self) -> &str {
            "echo"
        }

        async fn convert(
            &self,
            kind: FileKind,
            payload: String,
        ) -> Result<RemoteArtifact, ConversionError> {
            Ok(match kind {
                FileKind::Audio => RemoteArtifact::Audio(AudioResponse {
                    audio: payload,
                    duration: "0:00".to_string(),
                    file_size_mb: 0.0,
                    duration_seconds: None,
                    format: None,
                    sample_rate: None,
                    channels: None,
                    bit_depth: None,
                    original: None,
                }),
                FileKind::Image => RemoteArtifact::Image(ImageResponse {
                    image: payload,
                    width: None,
                    height: None,
                    format: None,
                    file_size_kb: None,
                }),
            })
        }
    }

    #[tokio::test]
    async fn test_client_is_object_safe() {
        let client: Box<dyn ConversionClient> = Box::new(EchoClient);
        let result = client
            .convert(FileKind::Image, "AAEC".to_string())
            .await
            .unwrap();
        assert_eq!(result.kind(), FileKind::Image);
        assert_eq!(result.payload(), "AAEC");
        assert_eq!(client.name(), "echo");
    }
}
