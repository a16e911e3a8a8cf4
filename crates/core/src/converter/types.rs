//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bytes in one megabyte as the size limits count them.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Sample rate of converted audio.
pub const AUDIO_SAMPLE_RATE_HZ: u32 = 44_100;
/// Channel count of converted audio.
pub const AUDIO_CHANNELS: u8 = 2;
/// Bit depth of converted audio.
pub const AUDIO_BIT_DEPTH: u8 = 16;

/// Edge length of converted cover images, in pixels.
pub const IMAGE_EDGE_PX: u32 = 1500;
/// JPEG quality of converted cover images.
pub const IMAGE_JPEG_QUALITY: u8 = 95;

/// Kind of a release asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// An audio track, converted to WAV.
    Audio,
    /// A cover image, converted to JPEG.
    Image,
}

impl FileKind {
    /// Derives the kind from a declared MIME type (`audio/*` or `image/*`).
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence.starts_with("audio/") {
            Some(Self::Audio)
        } else if essence.starts_with("image/") {
            Some(Self::Image)
        } else {
            None
        }
    }

    /// Extension of the converted artifact.
    pub fn output_extension(&self) -> &'static str {
        match self {
            Self::Audio => "wav",
            Self::Image => "jpg",
        }
    }

    /// MIME type of the converted artifact.
    pub fn output_content_type(&self) -> &'static str {
        match self {
            Self::Audio => "audio/wav",
            Self::Image => "image/jpeg",
        }
    }

    /// Default local size limit in megabytes.
    pub fn default_size_limit_mb(&self) -> u64 {
        match self {
            Self::Audio => 50,
            Self::Image => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Properties of the source audio as reported by the audio endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalAudioInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    /// Duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Body returned by the audio endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioResponse {
    /// Base64 WAV payload.
    pub audio: String,
    /// Duration formatted as `m:ss`.
    pub duration: String,
    /// Size of the WAV file in megabytes.
    #[serde(rename = "fileSizeMB")]
    pub file_size_mb: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_depth: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<OriginalAudioInfo>,
}

/// Body returned by the image endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    /// Base64 JPEG payload.
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Size of the JPEG in kilobytes. Not every endpoint version sends it.
    #[serde(rename = "fileSizeKB", skip_serializing_if = "Option::is_none")]
    pub file_size_kb: Option<f64>,
}

/// A successful conversion as returned by the remote endpoint.
///
/// The payload is still transport-encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteArtifact {
    Audio(AudioResponse),
    Image(ImageResponse),
}

impl RemoteArtifact {
    pub fn kind(&self) -> FileKind {
        match self {
            Self::Audio(_) => FileKind::Audio,
            Self::Image(_) => FileKind::Image,
        }
    }

    /// The encoded artifact bytes.
    pub fn payload(&self) -> &str {
        match self {
            Self::Audio(a) => &a.audio,
            Self::Image(i) => &i.image,
        }
    }
}

/// Error body some endpoints send alongside a failure status.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
