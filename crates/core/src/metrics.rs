//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversion requests against the remote endpoints
//! - Per-file batch processing
//! - Artifact export

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Conversion Endpoint Metrics
// =============================================================================

/// Conversion requests by file kind and outcome.
pub static CONVERSION_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "releasekit_conversion_requests_total",
            "Total requests sent to conversion endpoints",
        ),
        &["kind", "outcome"], // outcome: "success" or an error category
    )
    .expect("valid metric definition")
});

/// Conversion request duration in seconds.
pub static CONVERSION_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "releasekit_conversion_request_duration_seconds",
            "Round-trip duration of conversion requests",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["kind"],
    )
    .expect("valid metric definition")
});

// =============================================================================
// Batch Metrics
// =============================================================================

/// Files that reached a terminal state, by kind and result.
pub static FILES_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "releasekit_files_processed_total",
            "Total files processed by batch pipelines",
        ),
        &["kind", "result"], // result: "completed" or an error category
    )
    .expect("valid metric definition")
});

/// Time from leaving pending to reaching a terminal state.
pub static FILE_PROCESSING_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "releasekit_file_processing_duration_seconds",
            "Duration of per-file processing",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["kind"],
    )
    .expect("valid metric definition")
});

// =============================================================================
// Export Metrics
// =============================================================================

/// Artifacts written by the directory export sink.
pub static FILES_EXPORTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("releasekit_files_exported_total", "Total artifacts exported"),
        &["kind"],
    )
    .expect("valid metric definition")
});

/// Bytes written by the directory export sink.
pub static BYTES_EXPORTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("releasekit_bytes_exported_total", "Total artifact bytes exported")
        .expect("valid metric definition")
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Conversion endpoints
        Box::new(CONVERSION_REQUESTS.clone()),
        Box::new(CONVERSION_REQUEST_DURATION.clone()),
        // Batch
        Box::new(FILES_PROCESSED.clone()),
        Box::new(FILE_PROCESSING_DURATION.clone()),
        // Export
        Box::new(FILES_EXPORTED.clone()),
        Box::new(BYTES_EXPORTED.clone()),
    ]
}
