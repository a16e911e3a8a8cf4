//! Per-file conversion state and its lifecycle.
//!
//! ```text
//! Pending ──begin──> Processing ──complete──> Completed
//!    │                   └────────fail──────> Error
//!    └──────────cancel──────────────────────> Error (cancelled)
//! ```
//!
//! Completed and Error are terminal. Progress counters only move forward.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::converter::{
    ConversionError, ErrorCategory, FileKind, RemoteArtifact, AUDIO_BIT_DEPTH, AUDIO_CHANNELS,
    AUDIO_SAMPLE_RATE_HZ, IMAGE_EDGE_PX, IMAGE_JPEG_QUALITY,
};

use super::types::InputFile;

/// Lifecycle status of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl FileStatus {
    /// Whether no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse progress points reached while a file is processing.
///
/// The numbers are a display affordance, not a measurement of remote work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Local checks passed.
    Validated,
    /// Payload encoded for transport.
    Encoded,
    /// Request handed to the conversion client.
    Submitted,
    /// Successful response parsed.
    ResponseReceived,
    /// Returned artifact decoded to bytes.
    ArtifactDecoded,
}

impl Checkpoint {
    /// Upload progress implied by this checkpoint, if it moves it.
    pub fn upload_progress(&self) -> Option<u8> {
        match self {
            Self::Validated => Some(10),
            Self::Encoded => Some(50),
            Self::Submitted => Some(100),
            Self::ResponseReceived | Self::ArtifactDecoded => None,
        }
    }

    /// Processing progress implied by this checkpoint, if it moves it.
    pub fn processing_progress(&self) -> Option<u8> {
        match self {
            Self::Validated | Self::Encoded => None,
            Self::Submitted => Some(10),
            Self::ResponseReceived => Some(80),
            Self::ArtifactDecoded => Some(100),
        }
    }
}

/// Why a file ended in the error state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileError {
    pub category: ErrorCategory,
    pub message: String,
    /// HTTP status for remote rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl FileError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            status: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ValidationError, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::TransportError, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorCategory::Cancelled, "Batch was cancelled before this file started")
    }
}

impl From<ConversionError> for FileError {
    fn from(err: ConversionError) -> Self {
        Self {
            category: err.category(),
            message: err.to_string(),
            status: err.status(),
        }
    }
}

/// Descriptive metadata of a converted artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactMetadata {
    Audio {
        /// Duration as `m:ss`.
        duration: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_secs: Option<f64>,
        sample_rate: u32,
        channels: u8,
        bit_depth: u8,
        file_size_mb: f64,
        size_bytes: u64,
    },
    Image {
        width: u32,
        height: u32,
        quality: u8,
        file_size_kb: f64,
        size_bytes: u64,
    },
}

impl ArtifactMetadata {
    /// Builds metadata from the endpoint response and the decoded size.
    ///
    /// Fields the endpoint leaves out fall back to the fixed target format.
    pub fn from_remote(remote: &RemoteArtifact, size_bytes: u64) -> Self {
        match remote {
            RemoteArtifact::Audio(a) => Self::Audio {
                duration: a.duration.clone(),
                duration_secs: a.duration_seconds,
                sample_rate: a.sample_rate.unwrap_or(AUDIO_SAMPLE_RATE_HZ),
                channels: a.channels.unwrap_or(AUDIO_CHANNELS),
                bit_depth: a.bit_depth.unwrap_or(AUDIO_BIT_DEPTH),
                file_size_mb: a.file_size_mb,
                size_bytes,
            },
            RemoteArtifact::Image(i) => Self::Image {
                width: i.width.unwrap_or(IMAGE_EDGE_PX),
                height: i.height.unwrap_or(IMAGE_EDGE_PX),
                quality: IMAGE_JPEG_QUALITY,
                file_size_kb: i
                    .file_size_kb
                    .unwrap_or_else(|| round2(size_bytes as f64 / 1024.0)),
                size_bytes,
            },
        }
    }

    pub fn size_bytes(&self) -> u64 {
        match self {
            Self::Audio { size_bytes, .. } | Self::Image { size_bytes, .. } => *size_bytes,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A converted file ready for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionArtifact {
    /// Output file name with the rewritten extension.
    pub file_name: String,
    pub content_type: String,
    /// Converted bytes; shared so snapshots stay cheap.
    #[serde(skip)]
    pub bytes: Arc<[u8]>,
    pub metadata: ArtifactMetadata,
}

impl ConversionArtifact {
    /// Builds the artifact for `input` from the endpoint response and the
    /// decoded bytes.
    pub fn new(input: &InputFile, remote: &RemoteArtifact, bytes: Vec<u8>) -> Self {
        let metadata = ArtifactMetadata::from_remote(remote, bytes.len() as u64);
        Self {
            file_name: super::export::output_file_name(&input.name, input.kind),
            content_type: input.kind.output_content_type().to_string(),
            bytes: Arc::from(bytes),
            metadata,
        }
    }
}

/// Rejected state transition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Illegal transition from {from} to {to}")]
    Illegal { from: FileStatus, to: FileStatus },

    #[error("Progress can only be reported while processing (status: {0})")]
    NotProcessing(FileStatus),
}

/// Conversion state of one input file within a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileConversionState {
    id: String,
    original_name: String,
    kind: FileKind,
    size_bytes: u64,
    status: FileStatus,
    upload_progress: Option<u8>,
    processing_progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ConversionArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<FileError>,
}

impl FileConversionState {
    /// Creates the pending state for an input file.
    pub fn pending(input: &InputFile) -> Self {
        Self {
            id: input.id.clone(),
            original_name: input.name.clone(),
            kind: input.kind,
            size_bytes: input.size_bytes(),
            status: FileStatus::Pending,
            upload_progress: None,
            processing_progress: None,
            started_at: None,
            finished_at: None,
            result: None,
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    pub fn upload_progress(&self) -> Option<u8> {
        self.upload_progress
    }

    pub fn processing_progress(&self) -> Option<u8> {
        self.processing_progress
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// The converted artifact, set only once completed.
    pub fn result(&self) -> Option<&ConversionArtifact> {
        self.result.as_ref()
    }

    /// The failure, set only once in the error state.
    pub fn error(&self) -> Option<&FileError> {
        self.error.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Pending -> Processing. Both progress counters start at 0.
    pub fn begin(&mut self) -> Result<(), TransitionError> {
        self.expect_status(FileStatus::Pending, FileStatus::Processing)?;
        self.status = FileStatus::Processing;
        self.upload_progress = Some(0);
        self.processing_progress = Some(0);
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Moves the progress counters to `checkpoint`, never backwards.
    pub fn advance(&mut self, checkpoint: Checkpoint) -> Result<(), TransitionError> {
        if self.status != FileStatus::Processing {
            return Err(TransitionError::NotProcessing(self.status));
        }
        if let Some(upload) = checkpoint.upload_progress() {
            self.upload_progress = self.upload_progress.max(Some(upload));
        }
        if let Some(processing) = checkpoint.processing_progress() {
            self.processing_progress = self.processing_progress.max(Some(processing));
        }
        Ok(())
    }

    /// Processing -> Completed with the converted artifact.
    pub fn complete(&mut self, artifact: ConversionArtifact) -> Result<(), TransitionError> {
        self.expect_status(FileStatus::Processing, FileStatus::Completed)?;
        self.status = FileStatus::Completed;
        self.upload_progress = Some(100);
        self.processing_progress = Some(100);
        self.result = Some(artifact);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Processing -> Error. Progress stays where it stopped.
    pub fn fail(&mut self, error: FileError) -> Result<(), TransitionError> {
        self.expect_status(FileStatus::Processing, FileStatus::Error)?;
        self.status = FileStatus::Error;
        self.error = Some(error);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Pending -> Error for a file the batch never started.
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        self.expect_status(FileStatus::Pending, FileStatus::Error)?;
        self.status = FileStatus::Error;
        self.error = Some(FileError::cancelled());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn expect_status(&self, from: FileStatus, to: FileStatus) -> Result<(), TransitionError> {
        if self.status == from {
            Ok(())
        } else {
            Err(TransitionError::Illegal {
                from: self.status,
                to,
            })
        }
    }
}
