//! Mock conversion client for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::converter::{
    AudioResponse, ConversionClient, ConversionError, FileKind, ImageResponse, RemoteArtifact,
};

use super::fixtures;

/// A recorded conversion request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Zero-based position of this request among all requests.
    pub call_index: usize,
    pub kind: FileKind,
    /// The base64 payload that was submitted.
    pub payload: String,
    pub started_at: Instant,
    pub finished_at: Instant,
    pub success: bool,
}

/// Mock implementation of the ConversionClient trait.
///
/// Provides controllable behavior for testing:
/// - Track requests for assertions (including ordering and overlap)
/// - Simulate endpoint failures, either for the next call or a given call
/// - Control response bodies per file kind
/// - Simulate endpoint latency
///
/// Unless a response is configured, the mock echoes the submitted payload
/// back as the converted artifact, so decoded bytes equal the input bytes.
///
/// # Example
///
/// ```rust,ignore
/// use releasekit_core::testing::MockConversionClient;
///
/// let client = MockConversionClient::new();
/// client.fail_call(1, ConversionError::from_status(400, None)).await;
///
/// let pipeline = BatchPipeline::new(BatchConfig::default(), Arc::new(client.clone()), files);
/// pipeline.run().await?;
///
/// assert_eq!(client.call_count().await, 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockConversionClient {
    /// Recorded requests.
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
    /// Calls started so far, used to assign call indices.
    calls_started: Arc<AtomicUsize>,
    /// Errors scripted for specific call indices.
    call_errors: Arc<RwLock<HashMap<usize, ConversionError>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<ConversionError>>>,
    /// Fixed responses by file kind.
    responses: Arc<RwLock<HashMap<FileKind, RemoteArtifact>>>,
    /// Simulated endpoint latency in milliseconds.
    latency_ms: Arc<RwLock<u64>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for MockConversionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConversionClient {
    /// Create a new mock client with no latency.
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            calls_started: Arc::new(AtomicUsize::new(0)),
            call_errors: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            responses: Arc::new(RwLock::new(HashMap::new())),
            latency_ms: Arc::new(RwLock::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all recorded requests, in completion order.
    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    /// Get the number of requests that reached the mock.
    pub async fn call_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Highest number of requests that were in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: ConversionError) {
        *self.next_error.write().await = Some(error);
    }

    /// Configure the call with the given zero-based index to fail.
    pub async fn fail_call(&self, call_index: usize, error: ConversionError) {
        self.call_errors.write().await.insert(call_index, error);
    }

    /// Return `artifact` for every request of `kind`.
    pub async fn set_response(&self, kind: FileKind, artifact: RemoteArtifact) {
        self.responses.write().await.insert(kind, artifact);
    }

    /// Set the simulated endpoint latency.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency_ms.write().await = latency.as_millis() as u64;
    }

    async fn scripted_error(&self, call_index: usize) -> Option<ConversionError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Some(err);
        }
        self.call_errors.write().await.remove(&call_index)
    }

    async fn respond(&self, kind: FileKind, payload: &str) -> RemoteArtifact {
        if let Some(artifact) = self.responses.read().await.get(&kind) {
            return artifact.clone();
        }
        match kind {
            FileKind::Audio => RemoteArtifact::Audio(AudioResponse {
                audio: payload.to_string(),
                ..fixtures::audio_response("")
            }),
            FileKind::Image => RemoteArtifact::Image(ImageResponse {
                image: payload.to_string(),
                ..fixtures::image_response("")
            }),
        }
    }
}

#[async_trait]
impl ConversionClient for MockConversionClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(
        &self,
        kind: FileKind,
        payload: String,
    ) -> Result<RemoteArtifact, ConversionError> {
        let call_index = self.calls_started.fetch_add(1, Ordering::SeqCst);
        let started_at = Instant::now();

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let latency_ms = *self.latency_ms.read().await;
        if latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(latency_ms)).await;
        }

        let result = match self.scripted_error(call_index).await {
            Some(err) => Err(err),
            None => Ok(self.respond(kind, &payload).await),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.requests.write().await.push(RecordedRequest {
            call_index,
            kind,
            payload,
            started_at,
            finished_at: Instant::now(),
            success: result.is_ok(),
        });

        result
    }
}
