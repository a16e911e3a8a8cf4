//! Testing utilities and mock implementations.
//!
//! This module provides a mock [`ConversionClient`](crate::converter::ConversionClient)
//! and fixtures, allowing batch and server tests to run without the remote
//! conversion endpoints.
//!
//! # Example
//!
//! ```rust,ignore
//! use releasekit_core::testing::{fixtures, MockConversionClient};
//!
//! let client = MockConversionClient::new();
//! let files = vec![fixtures::audio_input("track.mp3", 1024), fixtures::image_input("cover.png", 512)];
//!
//! // Configure mock responses
//! client.set_next_error(ConversionError::from_status(400, None)).await;
//! ```

mod mock_client;

pub use mock_client::{MockConversionClient, RecordedRequest};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::batch::InputFile;
    use crate::converter::{
        AudioResponse, FileKind, ImageResponse, OriginalAudioInfo, AUDIO_BIT_DEPTH,
        AUDIO_CHANNELS, AUDIO_SAMPLE_RATE_HZ, BYTES_PER_MB, IMAGE_EDGE_PX,
    };

    /// Deterministic, non-empty file contents of `len` bytes.
    pub fn bytes(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    /// An audio input named `name` with `len` bytes of content.
    pub fn audio_input(name: &str, len: usize) -> InputFile {
        InputFile::new(
            format!("audio-{}", name),
            name,
            FileKind::Audio,
            bytes(len),
        )
    }

    /// An image input named `name` with `len` bytes of content.
    pub fn image_input(name: &str, len: usize) -> InputFile {
        InputFile::new(
            format!("image-{}", name),
            name,
            FileKind::Image,
            bytes(len),
        )
    }

    /// An input of `mb` megabytes, for size limit checks.
    pub fn oversized_input(name: &str, kind: FileKind, mb: u64) -> InputFile {
        let len = (mb * BYTES_PER_MB) as usize;
        InputFile::new(format!("big-{}", name), name, kind, vec![0u8; len])
    }

    /// A successful audio endpoint response carrying `audio`.
    pub fn audio_response(audio: &str) -> AudioResponse {
        AudioResponse {
            audio: audio.to_string(),
            duration: "3:25".to_string(),
            file_size_mb: 36.15,
            duration_seconds: Some(205.0),
            format: Some("wav".to_string()),
            sample_rate: Some(AUDIO_SAMPLE_RATE_HZ),
            channels: Some(AUDIO_CHANNELS),
            bit_depth: Some(AUDIO_BIT_DEPTH),
            original: Some(OriginalAudioInfo {
                channels: Some(2),
                sample_rate: Some(48_000),
                duration: Some(205.0),
            }),
        }
    }

    /// A successful image endpoint response carrying `image`.
    pub fn image_response(image: &str) -> ImageResponse {
        ImageResponse {
            image: image.to_string(),
            width: Some(IMAGE_EDGE_PX),
            height: Some(IMAGE_EDGE_PX),
            format: Some("jpeg".to_string()),
            file_size_kb: None,
        }
    }
}
