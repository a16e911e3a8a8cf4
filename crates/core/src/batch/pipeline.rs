//! Batch pipeline implementation.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::converter::{ConversionClient, BYTES_PER_MB};
use crate::encoder::{decode_payload, encode_payload_yielding};
use crate::metrics::{FILES_PROCESSED, FILE_PROCESSING_DURATION};

use super::config::BatchConfig;
use super::error::{BatchError, ExportError};
use super::export::{unique_file_name, ExportSink, ExportedFile};
use super::state::{
    Checkpoint, ConversionArtifact, FileConversionState, FileError, FileStatus, TransitionError,
};
use super::types::{BatchEvent, BatchSummary, InputFile};

/// Drives one batch of input files through conversion.
///
/// The pipeline owns the state of every file. Observers read it through
/// [`snapshot`](Self::snapshot) or follow changes through
/// [`subscribe`](Self::subscribe); only the pipeline mutates it.
///
/// A batch runs once. With the default `max_concurrent_files` of 1, file
/// `i + 1` is not started before file `i` is terminal.
pub struct BatchPipeline<C: ConversionClient + ?Sized> {
    id: String,
    config: BatchConfig,
    client: Arc<C>,
    inputs: Mutex<Vec<InputFile>>,
    states: RwLock<Vec<FileConversionState>>,
    events: broadcast::Sender<BatchEvent>,
    cancel: CancellationToken,
    started: AtomicBool,
}

impl<C: ConversionClient + ?Sized> BatchPipeline<C> {
    /// Creates a batch with every file pending, in input order.
    pub fn new(config: BatchConfig, client: Arc<C>, files: Vec<InputFile>) -> Self {
        let states = files.iter().map(FileConversionState::pending).collect();
        let (events, _) = broadcast::channel(config.event_buffer.max(1));

        Self {
            id: Uuid::new_v4().to_string(),
            config,
            client,
            inputs: Mutex::new(files),
            states: RwLock::new(states),
            events,
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Whether [`run`](Self::run) has been called.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Token that stops the batch between files.
    ///
    /// A file already in flight still finishes; files not yet started end
    /// as cancelled errors.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Receives every state change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.events.subscribe()
    }

    /// Current state of every file, in input order.
    pub async fn snapshot(&self) -> Vec<FileConversionState> {
        self.states.read().await.clone()
    }

    /// Current state of one file.
    pub async fn file(&self, file_id: &str) -> Option<FileConversionState> {
        self.states
            .read()
            .await
            .iter()
            .find(|s| s.id() == file_id)
            .cloned()
    }

    pub async fn summary(&self) -> BatchSummary {
        BatchSummary::from_states(&self.states.read().await)
    }

    /// Processes every file once and returns the final summary.
    ///
    /// Per-file failures are recorded on the file and never abort the
    /// batch. A second call fails with [`BatchError::AlreadyStarted`].
    pub async fn run(&self) -> Result<BatchSummary, BatchError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(BatchError::AlreadyStarted);
        }
        Ok(self.process_all().await)
    }

    /// Starts the batch on a background task.
    ///
    /// The started flag is claimed before returning, so of two concurrent
    /// callers exactly one gets the handle.
    pub fn spawn(self: &Arc<Self>) -> Result<JoinHandle<BatchSummary>, BatchError>
    where
        C: 'static,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(BatchError::AlreadyStarted);
        }
        let pipeline = Arc::clone(self);
        Ok(tokio::spawn(async move { pipeline.process_all().await }))
    }

    async fn process_all(&self) -> BatchSummary {
        let inputs = std::mem::take(&mut *self.inputs.lock().await);
        let limit = self.config.max_concurrent_files.max(1);
        let start = Instant::now();

        info!(
            batch_id = %self.id,
            files = inputs.len(),
            max_concurrent = limit,
            client = self.client.name(),
            "Starting batch"
        );

        stream::iter(inputs.into_iter().enumerate())
            .for_each_concurrent(limit, |(index, input)| self.process_file(index, input))
            .await;

        let summary = self.summary().await;
        let _ = self.events.send(BatchEvent::BatchFinished { summary });

        info!(
            batch_id = %self.id,
            completed = summary.completed,
            failed = summary.failed,
            total = summary.total,
            duration_ms = start.elapsed().as_millis() as u64,
            "Batch finished"
        );

        summary
    }

    async fn process_file(&self, index: usize, input: InputFile) {
        if self.cancel.is_cancelled() {
            debug!(batch_id = %self.id, file_id = %input.id, "Skipping file, batch cancelled");
            self.update(index, |s| s.cancel()).await;
            return;
        }

        self.update(index, |s| s.begin()).await;
        let start = Instant::now();

        match self.convert_file(index, &input).await {
            Ok(artifact) => {
                debug!(
                    batch_id = %self.id,
                    file_id = %input.id,
                    output = %artifact.file_name,
                    bytes = artifact.bytes.len(),
                    "File converted"
                );
                self.update(index, |s| s.complete(artifact)).await;
                FILES_PROCESSED
                    .with_label_values(&[input.kind.as_str(), "completed"])
                    .inc();
            }
            Err(error) => {
                warn!(
                    batch_id = %self.id,
                    file_id = %input.id,
                    name = %input.name,
                    category = %error.category,
                    "File conversion failed: {}",
                    error.message
                );
                FILES_PROCESSED
                    .with_label_values(&[input.kind.as_str(), error.category.as_str()])
                    .inc();
                self.update(index, |s| s.fail(error)).await;
            }
        }

        FILE_PROCESSING_DURATION
            .with_label_values(&[input.kind.as_str()])
            .observe(start.elapsed().as_secs_f64());
    }

    async fn convert_file(
        &self,
        index: usize,
        input: &InputFile,
    ) -> Result<ConversionArtifact, FileError> {
        self.validate(input)?;
        self.checkpoint(index, Checkpoint::Validated).await;

        let payload = encode_payload_yielding(&input.bytes).await;
        self.checkpoint(index, Checkpoint::Encoded).await;

        self.checkpoint(index, Checkpoint::Submitted).await;
        let remote = self.client.convert(input.kind, payload).await?;
        self.checkpoint(index, Checkpoint::ResponseReceived).await;

        if remote.kind() != input.kind {
            return Err(FileError::transport(format!(
                "Endpoint returned a {} artifact for a {} file",
                remote.kind(),
                input.kind
            )));
        }

        let bytes = decode_payload(remote.payload())
            .map_err(|e| FileError::transport(format!("Malformed artifact: {}", e)))?;
        self.checkpoint(index, Checkpoint::ArtifactDecoded).await;

        Ok(ConversionArtifact::new(input, &remote, bytes))
    }

    fn validate(&self, input: &InputFile) -> Result<(), FileError> {
        let size = input.size_bytes();
        if size == 0 {
            return Err(FileError::validation("File is empty"));
        }

        let limit = self.config.max_size_bytes(input.kind);
        if size > limit {
            return Err(FileError::validation(format!(
                "File is too large ({:.1} MB). Maximum: {} MB",
                size as f64 / BYTES_PER_MB as f64,
                self.config.max_size_mb(input.kind)
            )));
        }

        Ok(())
    }

    async fn checkpoint(&self, index: usize, checkpoint: Checkpoint) {
        self.update(index, |s| s.advance(checkpoint)).await;
    }

    /// Applies one transition and publishes the resulting state.
    async fn update<F>(&self, index: usize, transition: F)
    where
        F: FnOnce(&mut FileConversionState) -> Result<(), TransitionError>,
    {
        let updated = {
            let mut states = self.states.write().await;
            let Some(state) = states.get_mut(index) else {
                return;
            };
            if let Err(e) = transition(state) {
                warn!(batch_id = %self.id, file_id = %state.id(), "Ignored state change: {}", e);
                return;
            }
            state.clone()
        };

        debug!(
            batch_id = %self.id,
            file_id = %updated.id(),
            status = %updated.status(),
            upload = ?updated.upload_progress(),
            processing = ?updated.processing_progress(),
            "File state changed"
        );

        // No receivers is fine; nobody is watching.
        let _ = self.events.send(BatchEvent::FileUpdated { state: updated });
    }

    /// The artifact of one completed file.
    pub async fn artifact(&self, file_id: &str) -> Option<ExportedFile> {
        let states = self.states.read().await;
        let state = states.iter().find(|s| s.id() == file_id)?;
        state
            .result()
            .map(|artifact| ExportedFile::from_artifact(state.id(), state.kind(), artifact))
    }

    /// Hands every completed artifact to `sink`, in input order.
    ///
    /// Files that are not completed are skipped. Output names that collide
    /// within the batch are numbered (`track (1).wav`). Returns the exported
    /// file names.
    pub async fn download_all(&self, sink: &dyn ExportSink) -> Result<Vec<String>, ExportError> {
        let exports: Vec<ExportedFile> = {
            let states = self.states.read().await;
            states
                .iter()
                .filter(|s| s.status() == FileStatus::Completed)
                .filter_map(|s| {
                    s.result()
                        .map(|artifact| ExportedFile::from_artifact(s.id(), s.kind(), artifact))
                })
                .collect()
        };

        let mut taken = HashSet::with_capacity(exports.len());
        let mut names = Vec::with_capacity(exports.len());
        for mut file in exports {
            file.file_name = unique_file_name(&file.file_name, &taken);
            sink.deliver(&file).await?;
            taken.insert(file.file_name.clone());
            names.push(file.file_name);
        }

        info!(batch_id = %self.id, exported = names.len(), "Exported completed files");
        Ok(names)
    }
}
