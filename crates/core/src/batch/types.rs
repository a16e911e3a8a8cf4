//! Types for the batch module.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::converter::FileKind;

use super::error::BatchError;
use super::state::{FileConversionState, FileStatus};

/// A user-selected file captured for conversion.
///
/// Immutable once created; the pipeline only reads its bytes.
#[derive(Clone)]
pub struct InputFile {
    /// Caller-assigned identifier, unique within the batch.
    pub id: String,
    /// Original file name.
    pub name: String,
    pub kind: FileKind,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: FileKind,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            bytes,
        }
    }

    /// Captures an uploaded file, deriving its kind from the declared
    /// content type and assigning a fresh id.
    pub fn from_upload(
        name: impl Into<String>,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Self, BatchError> {
        let name = name.into();
        let kind = FileKind::from_content_type(content_type).ok_or_else(|| {
            BatchError::UnsupportedContentType {
                name: name.clone(),
                content_type: content_type.to_string(),
            }
        })?;
        Ok(Self::new(Uuid::new_v4().to_string(), name, kind, bytes))
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// Aggregate view of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    /// Every file has reached a terminal state.
    pub finished: bool,
}

impl BatchSummary {
    pub fn from_states(states: &[FileConversionState]) -> Self {
        let mut summary = Self {
            total: states.len(),
            ..Default::default()
        };
        for state in states {
            match state.status() {
                FileStatus::Pending => summary.pending += 1,
                FileStatus::Processing => summary.processing += 1,
                FileStatus::Completed => summary.completed += 1,
                FileStatus::Error => summary.failed += 1,
            }
        }
        summary.finished = summary.pending == 0 && summary.processing == 0;
        summary
    }

    /// Completed files as a share of all files, 0-100.
    pub fn completed_percent(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f32 / self.total as f32 * 100.0
        }
    }
}

/// Change notification published by a running batch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchEvent {
    /// One file's state changed; carries the new state.
    FileUpdated { state: FileConversionState },
    /// Every file is terminal.
    BatchFinished { summary: BatchSummary },
}
