//! Export of converted artifacts ("download all").

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::converter::FileKind;
use crate::metrics::{BYTES_EXPORTED, FILES_EXPORTED};

use super::error::ExportError;
use super::state::ConversionArtifact;

/// Rewrites the final extension of `original` to the one for `kind`.
///
/// `track.mp3` becomes `track.wav`; a name without an extension gets one
/// appended.
pub fn output_file_name(original: &str, kind: FileKind) -> String {
    let stem = match original.rfind('.') {
        Some(pos) if pos + 1 < original.len() && !original[pos + 1..].contains('/') => {
            &original[..pos]
        }
        _ => original.trim_end_matches('.'),
    };
    format!("{}.{}", stem, kind.output_extension())
}

/// Returns `name` unless it is already in `taken`, otherwise the first free
/// `stem (n).ext` counting from 1.
pub fn unique_file_name(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => name.split_at(pos),
        _ => (name, ""),
    };
    (1..)
        .map(|n| format!("{} ({}){}", stem, n, ext))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// One artifact handed to an export sink.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub file_id: String,
    pub file_name: String,
    pub content_type: String,
    pub kind: FileKind,
    #[serde(skip)]
    pub bytes: Arc<[u8]>,
}

impl ExportedFile {
    pub fn from_artifact(file_id: &str, kind: FileKind, artifact: &ConversionArtifact) -> Self {
        Self {
            file_id: file_id.to_string(),
            file_name: artifact.file_name.clone(),
            content_type: artifact.content_type.clone(),
            kind,
            bytes: Arc::clone(&artifact.bytes),
        }
    }
}

/// Destination for exported artifacts; one `deliver` call per file.
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn deliver(&self, file: &ExportedFile) -> Result<(), ExportError>;
}

/// Writes each artifact into a directory under its output name.
#[derive(Debug, Clone)]
pub struct DirectoryExportSink {
    dir: PathBuf,
}

impl DirectoryExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn target_path(&self, file_name: &str) -> Result<PathBuf, ExportError> {
        let name = Path::new(file_name)
            .file_name()
            .filter(|n| n.len() == file_name.len())
            .ok_or_else(|| ExportError::UnsafeFileName(file_name.to_string()))?;
        Ok(self.dir.join(name))
    }
}

#[async_trait]
impl ExportSink for DirectoryExportSink {
    async fn deliver(&self, file: &ExportedFile) -> Result<(), ExportError> {
        let path = self.target_path(&file.file_name)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ExportError::DirectoryFailed {
                path: self.dir.clone(),
                source,
            })?;

        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(|source| ExportError::WriteFailed {
                path: path.clone(),
                source,
            })?;

        FILES_EXPORTED.with_label_values(&[file.kind.as_str()]).inc();
        BYTES_EXPORTED.inc_by(file.bytes.len() as u64);
        debug!(path = %path.display(), bytes = file.bytes.len(), "Exported artifact");
        Ok(())
    }
}

/// Keeps delivered artifacts in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingExportSink {
    delivered: Arc<Mutex<Vec<ExportedFile>>>,
}

impl CollectingExportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in delivery order.
    pub async fn delivered(&self) -> Vec<ExportedFile> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl ExportSink for CollectingExportSink {
    async fn deliver(&self, file: &ExportedFile) -> Result<(), ExportError> {
        self.delivered.lock().await.push(file.clone());
        Ok(())
    }
}
