//! Configuration for the batch module.

use serde::{Deserialize, Serialize};

use crate::converter::{FileKind, BYTES_PER_MB};

/// Configuration for batch processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Largest accepted audio file in megabytes.
    #[serde(default = "default_max_audio_size_mb")]
    pub max_audio_size_mb: u64,

    /// Largest accepted image file in megabytes.
    #[serde(default = "default_max_image_size_mb")]
    pub max_image_size_mb: u64,

    /// Files in flight at once. 1 processes strictly in input order.
    #[serde(default = "default_max_concurrent_files")]
    pub max_concurrent_files: usize,

    /// Capacity of the event channel per batch.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_max_audio_size_mb() -> u64 {
    FileKind::Audio.default_size_limit_mb()
}

fn default_max_image_size_mb() -> u64 {
    FileKind::Image.default_size_limit_mb()
}

fn default_max_concurrent_files() -> usize {
    1
}

fn default_event_buffer() -> usize {
    256
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_audio_size_mb: default_max_audio_size_mb(),
            max_image_size_mb: default_max_image_size_mb(),
            max_concurrent_files: default_max_concurrent_files(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl BatchConfig {
    /// Size limit for `kind` in megabytes.
    pub fn max_size_mb(&self, kind: FileKind) -> u64 {
        match kind {
            FileKind::Audio => self.max_audio_size_mb,
            FileKind::Image => self.max_image_size_mb,
        }
    }

    /// Size limit for `kind` in bytes. A file exactly at the limit passes.
    pub fn max_size_bytes(&self, kind: FileKind) -> u64 {
        self.max_size_mb(kind).saturating_mul(BYTES_PER_MB)
    }

    /// Sets how many files may be in flight at once.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_files = max;
        self
    }

    /// Sets both size limits in megabytes.
    pub fn with_size_limits(mut self, audio_mb: u64, image_mb: u64) -> Self {
        self.max_audio_size_mb = audio_mb;
        self.max_image_size_mb = image_mb;
        self
    }
}
