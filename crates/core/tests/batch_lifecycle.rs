//! Batch lifecycle integration tests.
//!
//! These tests drive the batch pipeline with the mock conversion client:
//! - Every file reaches a terminal state
//! - Files are processed strictly in order by default
//! - Local size validation and remote failures stay isolated per file
//! - Download-all exports only completed files under converted names
//! - Cancellation, single-shot runs and event ordering

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use releasekit_core::{
    batch::{BatchConfig, BatchError, BatchEvent, BatchPipeline, CollectingExportSink, FileStatus},
    converter::{ConversionError, ErrorCategory, FileKind},
    testing::{fixtures, MockConversionClient},
    DirectoryExportSink, InputFile,
};

/// Test helper holding a pipeline and the mock it talks to.
struct TestHarness {
    pipeline: Arc<BatchPipeline<MockConversionClient>>,
    client: MockConversionClient,
}

impl TestHarness {
    fn new(files: Vec<InputFile>) -> Self {
        Self::with_config(BatchConfig::default(), files)
    }

    fn with_config(config: BatchConfig, files: Vec<InputFile>) -> Self {
        let client = MockConversionClient::new();
        let pipeline = Arc::new(BatchPipeline::new(config, Arc::new(client.clone()), files));
        Self { pipeline, client }
    }
}

fn release_files() -> Vec<InputFile> {
    vec![
        fixtures::audio_input("track.mp3", 4096),
        fixtures::image_input("cover.png", 2048),
        fixtures::audio_input("intro.flac", 1024),
    ]
}

// =============================================================================
// Terminal State Tests
// =============================================================================

#[tokio::test]
async fn test_all_files_start_pending() {
    let harness = TestHarness::new(release_files());

    let snapshot = harness.pipeline.snapshot().await;
    assert_eq!(snapshot.len(), 3);
    for state in &snapshot {
        assert_eq!(state.status(), FileStatus::Pending);
        assert_eq!(state.upload_progress(), None);
        assert_eq!(state.processing_progress(), None);
    }
    assert!(!harness.pipeline.is_started());
}

#[tokio::test]
async fn test_every_file_reaches_terminal_state() {
    let harness = TestHarness::new(release_files());

    let summary = harness.pipeline.run().await.unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.completed + summary.failed, 3);
    assert!(summary.finished);

    for state in harness.pipeline.snapshot().await {
        assert!(state.is_terminal());
        // Exactly one of result or error
        assert!(state.result().is_some() != state.error().is_some());
    }
}

#[tokio::test]
async fn test_completed_file_carries_artifact() {
    let input = fixtures::audio_input("track.mp3", 4096);
    let expected = input.bytes.clone();
    let harness = TestHarness::new(vec![input]);

    harness.pipeline.run().await.unwrap();

    let state = &harness.pipeline.snapshot().await[0];
    assert_eq!(state.status(), FileStatus::Completed);
    assert_eq!(state.upload_progress(), Some(100));
    assert_eq!(state.processing_progress(), Some(100));

    let artifact = state.result().unwrap();
    assert_eq!(artifact.file_name, "track.wav");
    assert_eq!(artifact.content_type, "audio/wav");
    assert_eq!(&*artifact.bytes, expected.as_slice());
}

#[tokio::test]
async fn test_empty_batch_finishes_immediately() {
    let harness = TestHarness::new(Vec::new());

    let summary = harness.pipeline.run().await.unwrap();
    assert_eq!(summary.total, 0);
    assert!(summary.finished);
    assert_eq!(harness.client.call_count().await, 0);
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[tokio::test]
async fn test_files_processed_sequentially_in_order() {
    let harness = TestHarness::new(release_files());
    harness.client.set_latency(Duration::from_millis(20)).await;

    harness.pipeline.run().await.unwrap();

    let requests = harness.client.recorded_requests().await;
    assert_eq!(requests.len(), 3);
    assert_eq!(harness.client.max_in_flight(), 1);

    let kinds: Vec<FileKind> = requests.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![FileKind::Audio, FileKind::Image, FileKind::Audio]);

    for pair in requests.windows(2) {
        assert!(
            pair[1].started_at >= pair[0].finished_at,
            "Request {} started before request {} finished",
            pair[1].call_index,
            pair[0].call_index
        );
    }
}

#[tokio::test]
async fn test_bounded_concurrency() {
    let config = BatchConfig::default().with_max_concurrent(2);
    let files = (0..4)
        .map(|i| fixtures::audio_input(&format!("track{}.mp3", i), 512))
        .collect();
    let harness = TestHarness::with_config(config, files);
    harness.client.set_latency(Duration::from_millis(50)).await;

    let summary = harness.pipeline.run().await.unwrap();
    assert_eq!(summary.completed, 4);
    assert!(harness.client.max_in_flight() <= 2);
    assert!(harness.client.max_in_flight() >= 1);
}

#[tokio::test]
async fn test_events_follow_state_machine() {
    let harness = TestHarness::new(release_files());
    let mut events = harness.pipeline.subscribe();

    harness.pipeline.run().await.unwrap();

    let mut updates = Vec::new();
    let mut finished = None;
    while let Ok(event) = events.try_recv() {
        match event {
            BatchEvent::FileUpdated { state } => updates.push(state),
            BatchEvent::BatchFinished { summary } => finished = Some(summary),
        }
    }

    let summary = finished.expect("BatchFinished should be published");
    assert_eq!(summary.completed, 3);

    // Sequential: all updates of file i come before any update of file i + 1
    let order: Vec<String> = updates.iter().map(|s| s.id().to_string()).collect();
    let mut seen = Vec::new();
    for id in order {
        if seen.last() != Some(&id) {
            assert!(!seen.contains(&id), "File {} resumed after another file", id);
            seen.push(id);
        }
    }
    assert_eq!(seen.len(), 3);

    // Progress never decreases within a file
    for id in &seen {
        let file_updates: Vec<_> = updates.iter().filter(|s| s.id() == id).collect();
        assert_eq!(file_updates.first().unwrap().status(), FileStatus::Processing);
        assert_eq!(file_updates.last().unwrap().status(), FileStatus::Completed);
        for pair in file_updates.windows(2) {
            assert!(pair[1].upload_progress() >= pair[0].upload_progress());
            assert!(pair[1].processing_progress() >= pair[0].processing_progress());
        }
    }
}

// =============================================================================
// Validation Tests
// =============================================================================

#[tokio::test]
async fn test_oversized_audio_fails_validation_without_request() {
    let harness = TestHarness::new(vec![fixtures::oversized_input(
        "long.wav",
        FileKind::Audio,
        60,
    )]);

    harness.pipeline.run().await.unwrap();

    let state = &harness.pipeline.snapshot().await[0];
    assert_eq!(state.status(), FileStatus::Error);
    let error = state.error().unwrap();
    assert_eq!(error.category, ErrorCategory::ValidationError);
    assert!(error.message.contains("Maximum: 50 MB"));
    assert_eq!(harness.client.call_count().await, 0);
}

#[tokio::test]
async fn test_oversized_image_fails_validation_without_request() {
    let harness = TestHarness::new(vec![fixtures::oversized_input(
        "poster.tiff",
        FileKind::Image,
        11,
    )]);

    harness.pipeline.run().await.unwrap();

    let state = &harness.pipeline.snapshot().await[0];
    let error = state.error().unwrap();
    assert_eq!(error.category, ErrorCategory::ValidationError);
    assert!(error.message.contains("Maximum: 10 MB"));
    assert_eq!(harness.client.call_count().await, 0);
}

#[tokio::test]
async fn test_size_limit_is_inclusive() {
    let harness = TestHarness::new(vec![fixtures::oversized_input(
        "cover.png",
        FileKind::Image,
        10,
    )]);

    let summary = harness.pipeline.run().await.unwrap();
    assert_eq!(summary.completed, 1);
    assert_eq!(harness.client.call_count().await, 1);
}

#[tokio::test]
async fn test_empty_file_fails_validation() {
    let empty = InputFile::new("empty", "silence.mp3", FileKind::Audio, Vec::new());
    let harness = TestHarness::new(vec![empty]);

    harness.pipeline.run().await.unwrap();

    let state = &harness.pipeline.snapshot().await[0];
    assert_eq!(
        state.error().unwrap().category,
        ErrorCategory::ValidationError
    );
    assert_eq!(harness.client.call_count().await, 0);
}

#[tokio::test]
async fn test_configured_limits_apply() {
    let config = BatchConfig::default().with_size_limits(1, 1);
    let harness = TestHarness::with_config(
        config,
        vec![fixtures::oversized_input("track.mp3", FileKind::Audio, 2)],
    );

    harness.pipeline.run().await.unwrap();

    let error = harness.pipeline.snapshot().await[0].error().cloned().unwrap();
    assert_eq!(error.category, ErrorCategory::ValidationError);
    assert!(error.message.contains("Maximum: 1 MB"));
}

// =============================================================================
// Failure Isolation Tests
// =============================================================================

#[tokio::test]
async fn test_middle_failure_is_isolated() {
    let harness = TestHarness::new(release_files());
    harness
        .client
        .fail_call(1, ConversionError::from_status(400, Some("bad image".into())))
        .await;

    let summary = harness.pipeline.run().await.unwrap();
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 1);

    let snapshot = harness.pipeline.snapshot().await;
    assert_eq!(snapshot[0].status(), FileStatus::Completed);
    assert_eq!(snapshot[1].status(), FileStatus::Error);
    assert_eq!(snapshot[2].status(), FileStatus::Completed);

    let error = snapshot[1].error().unwrap();
    assert_eq!(error.category, ErrorCategory::InvalidFormat);
    assert_eq!(error.status, Some(400));

    // Subsequent files were still submitted
    assert_eq!(harness.client.call_count().await, 3);
}

#[tokio::test]
async fn test_remote_errors_map_to_categories() {
    let cases = [
        (ConversionError::from_status(413, None), ErrorCategory::PayloadTooLarge),
        (ConversionError::from_status(400, None), ErrorCategory::InvalidFormat),
        (ConversionError::from_status(502, None), ErrorCategory::ServerError),
        (ConversionError::transport("connection reset"), ErrorCategory::TransportError),
    ];

    for (error, expected) in cases {
        let harness = TestHarness::new(vec![fixtures::audio_input("track.mp3", 64)]);
        harness.client.set_next_error(error).await;

        harness.pipeline.run().await.unwrap();

        let state = &harness.pipeline.snapshot().await[0];
        assert_eq!(state.error().unwrap().category, expected);
        assert!(state.result().is_none());
    }
}

#[tokio::test]
async fn test_malformed_artifact_is_transport_error() {
    let harness = TestHarness::new(vec![fixtures::image_input("cover.png", 64)]);
    harness
        .client
        .set_response(
            FileKind::Image,
            releasekit_core::RemoteArtifact::Image(fixtures::image_response("not base64!")),
        )
        .await;

    harness.pipeline.run().await.unwrap();

    let state = &harness.pipeline.snapshot().await[0];
    assert_eq!(
        state.error().unwrap().category,
        ErrorCategory::TransportError
    );
    // Upload finished before the response was rejected
    assert_eq!(state.upload_progress(), Some(100));
}

// =============================================================================
// Run Control Tests
// =============================================================================

#[tokio::test]
async fn test_second_run_is_rejected() {
    let harness = TestHarness::new(release_files());

    harness.pipeline.run().await.unwrap();
    let second = harness.pipeline.run().await;
    assert!(matches!(second, Err(BatchError::AlreadyStarted)));
    assert_eq!(harness.client.call_count().await, 3);
}

#[tokio::test]
async fn test_cancel_before_run_cancels_all() {
    let harness = TestHarness::new(release_files());
    harness.pipeline.cancel();

    let summary = harness.pipeline.run().await.unwrap();
    assert_eq!(summary.failed, 3);
    assert_eq!(harness.client.call_count().await, 0);

    for state in harness.pipeline.snapshot().await {
        assert_eq!(state.error().unwrap().category, ErrorCategory::Cancelled);
    }
}

#[tokio::test]
async fn test_cancel_mid_run_finishes_current_file() {
    let harness = TestHarness::new(release_files());
    harness.client.set_latency(Duration::from_millis(100)).await;
    let mut events = harness.pipeline.subscribe();

    let pipeline = Arc::clone(&harness.pipeline);
    let handle = tokio::spawn(async move { pipeline.run().await });

    // Wait until the first file is in flight
    loop {
        match events.recv().await.unwrap() {
            BatchEvent::FileUpdated { state } if state.status() == FileStatus::Processing => break,
            _ => {}
        }
    }
    harness.pipeline.cancel_token().cancel();

    let summary = handle.await.unwrap().unwrap();
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 2);

    let snapshot = harness.pipeline.snapshot().await;
    assert_eq!(snapshot[0].status(), FileStatus::Completed);
    assert_eq!(
        snapshot[2].error().unwrap().category,
        ErrorCategory::Cancelled
    );
    assert_eq!(harness.client.call_count().await, 1);
}

// =============================================================================
// Download All Tests
// =============================================================================

#[tokio::test]
async fn test_download_all_exports_completed_only() {
    let files = vec![
        fixtures::audio_input("track.mp3", 256),
        fixtures::image_input("cover.png", 256),
        fixtures::audio_input("broken.mp3", 256),
    ];
    let harness = TestHarness::new(files);
    harness
        .client
        .fail_call(2, ConversionError::from_status(500, None))
        .await;

    harness.pipeline.run().await.unwrap();

    let sink = CollectingExportSink::new();
    let names = harness.pipeline.download_all(&sink).await.unwrap();
    assert_eq!(names, vec!["track.wav", "cover.jpg"]);

    let delivered = sink.delivered().await;
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].content_type, "audio/wav");
    assert_eq!(delivered[1].content_type, "image/jpeg");
}

#[tokio::test]
async fn test_download_all_before_run_exports_nothing() {
    let harness = TestHarness::new(release_files());

    let sink = CollectingExportSink::new();
    let names = harness.pipeline.download_all(&sink).await.unwrap();
    assert!(names.is_empty());
}

#[tokio::test]
async fn test_download_all_to_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = fixtures::image_input("cover.final.png", 128);
    let expected = input.bytes.clone();
    let harness = TestHarness::new(vec![input]);

    harness.pipeline.run().await.unwrap();

    let sink = DirectoryExportSink::new(temp_dir.path().join("release"));
    let names = harness.pipeline.download_all(&sink).await.unwrap();
    assert_eq!(names, vec!["cover.final.jpg"]);

    let written = std::fs::read(temp_dir.path().join("release").join("cover.final.jpg")).unwrap();
    assert_eq!(written, expected);
}

#[tokio::test]
async fn test_download_all_keeps_files_with_same_stem() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let first = fixtures::audio_input("track.mp3", 100);
    let second = fixtures::audio_input("track.flac", 200);
    let (first_bytes, second_bytes) = (first.bytes.clone(), second.bytes.clone());
    let harness = TestHarness::new(vec![first, second]);

    let summary = harness.pipeline.run().await.unwrap();
    assert_eq!(summary.completed, 2);

    let out = temp_dir.path().join("release");
    let sink = DirectoryExportSink::new(&out);
    let names = harness.pipeline.download_all(&sink).await.unwrap();
    assert_eq!(names, vec!["track.wav", "track (1).wav"]);

    let on_disk = std::fs::read_dir(&out).unwrap().count();
    assert_eq!(on_disk, 2);
    assert_eq!(std::fs::read(out.join("track.wav")).unwrap(), first_bytes);
    assert_eq!(std::fs::read(out.join("track (1).wav")).unwrap(), second_bytes);
}

#[tokio::test]
async fn test_artifact_lookup() {
    let harness = TestHarness::new(release_files());
    harness.pipeline.run().await.unwrap();

    let first_id = harness.pipeline.snapshot().await[0].id().to_string();
    let artifact = harness.pipeline.artifact(&first_id).await.unwrap();
    assert_eq!(artifact.file_name, "track.wav");
    assert!(harness.pipeline.artifact("missing").await.is_none());
}
