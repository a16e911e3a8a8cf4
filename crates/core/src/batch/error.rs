//! Error types for the batch module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from batch-level operations.
///
/// Per-file failures never show up here; they are recorded on the file's
/// state instead.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The batch has already been run.
    #[error("Batch has already been started")]
    AlreadyStarted,

    /// The declared content type is neither audio nor image.
    #[error("Unsupported content type '{content_type}' for file {name}")]
    UnsupportedContentType { name: String, content_type: String },
}

/// Errors from delivering artifacts to an export sink.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The export directory could not be created.
    #[error("Failed to create export directory: {path}")]
    DirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing one artifact failed.
    #[error("Failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact name would escape the export directory.
    #[error("Refusing to export unsafe file name: {0}")]
    UnsafeFileName(String),
}
