//! Converter module: the remote conversion contract.
//!
//! This module provides the `ConversionClient` trait and the HTTP
//! implementation that talks to the two stateless endpoints:
//!
//! - Audio: any audio in, WAV stereo 44.1kHz 16-bit out
//! - Image: any image in, JPEG 1500x1500 quality 95 out
//!
//! Both take the base64 file as a `text/plain` POST body and answer with a
//! JSON object carrying the base64 artifact plus descriptive metadata.
//!
//! # Example
//!
//! ```ignore
//! use releasekit_core::converter::{ConversionClient, EndpointConfig, FileKind, HttpConversionClient};
//! use releasekit_core::encoder::encode_payload;
//!
//! let client = HttpConversionClient::new(EndpointConfig::new(audio_url, image_url))?;
//! let artifact = client.convert(FileKind::Image, encode_payload(&bytes)).await?;
//! ```

mod config;
mod error;
mod http;
mod traits;
mod types;

pub use config::EndpointConfig;
pub use error::{ConversionError, ErrorCategory};
pub use http::HttpConversionClient;
pub use traits::ConversionClient;
pub use types::{
    AudioResponse, FileKind, ImageResponse, OriginalAudioInfo, RemoteArtifact, AUDIO_BIT_DEPTH,
    AUDIO_CHANNELS, AUDIO_SAMPLE_RATE_HZ, BYTES_PER_MB, IMAGE_EDGE_PX, IMAGE_JPEG_QUALITY,
};
