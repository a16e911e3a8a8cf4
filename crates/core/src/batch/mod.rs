//! Batch module: per-file conversion state and the pipeline that drives it.
//!
//! A batch is the set of files submitted together. The `BatchPipeline`:
//! - creates one pending `FileConversionState` per input, in order
//! - validates, encodes, converts and decodes each file
//! - records every failure on the file itself, never aborting the batch
//! - publishes each state change as a `BatchEvent`
//! - exports completed artifacts through an `ExportSink`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use releasekit_core::batch::{BatchConfig, BatchPipeline, DirectoryExportSink, InputFile};
//!
//! let files = vec![
//!     InputFile::from_upload("track.mp3", "audio/mpeg", track_bytes)?,
//!     InputFile::from_upload("cover.png", "image/png", cover_bytes)?,
//! ];
//! let pipeline = BatchPipeline::new(BatchConfig::default(), Arc::new(client), files);
//!
//! let mut events = pipeline.subscribe();
//! let summary = pipeline.run().await?;
//! println!("Converted {}/{}", summary.completed, summary.total);
//!
//! pipeline.download_all(&DirectoryExportSink::new("exports")).await?;
//! ```

mod config;
mod error;
mod export;
mod pipeline;
mod state;
mod types;

pub use config::BatchConfig;
pub use error::{BatchError, ExportError};
pub use export::{
    output_file_name, unique_file_name, CollectingExportSink, DirectoryExportSink, ExportSink,
    ExportedFile,
};
pub use pipeline::BatchPipeline;
pub use state::{
    ArtifactMetadata, Checkpoint, ConversionArtifact, FileConversionState, FileError, FileStatus,
    TransitionError,
};
pub use types::{BatchEvent, BatchSummary, InputFile};
