//! Batch API handlers.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use releasekit_core::{
    BatchError, BatchPipeline, BatchSummary, DirectoryExportSink, FileConversionState, InputFile,
};

use super::ws::forward_batch_events;
use crate::metrics::BATCHES_CREATED_TOTAL;
use crate::state::{AppState, Batch};

/// Content type assumed for parts that do not declare one.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Full view of one batch.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub id: String,
    pub started: bool,
    pub summary: BatchSummary,
    pub files: Vec<FileConversionState>,
}

impl BatchResponse {
    async fn from_batch(batch: &Batch) -> Self {
        Self {
            id: batch.id().to_string(),
            started: batch.is_started(),
            summary: batch.summary().await,
            files: batch.snapshot().await,
        }
    }
}

/// An uploaded part that was left out of the batch.
#[derive(Debug, Serialize)]
pub struct RejectedFile {
    pub name: String,
    pub content_type: String,
    pub error: String,
}

/// Response for creating a batch
#[derive(Debug, Serialize)]
pub struct CreateBatchResponse {
    #[serde(flatten)]
    pub batch: BatchResponse,
    pub rejected: Vec<RejectedFile>,
}

/// One entry in the batch list.
#[derive(Debug, Serialize)]
pub struct BatchListItem {
    pub id: String,
    pub started: bool,
    pub summary: BatchSummary,
}

/// Response for listing batches
#[derive(Debug, Serialize)]
pub struct ListBatchesResponse {
    pub batches: Vec<BatchListItem>,
    pub total: usize,
}

/// Response for start and cancel requests
#[derive(Debug, Serialize)]
pub struct BatchActionResponse {
    pub id: String,
    pub summary: BatchSummary,
}

/// Response for exporting a batch
#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub id: String,
    pub dir: String,
    pub files: Vec<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct BatchErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<BatchErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(BatchErrorResponse {
            error: error.into(),
        }),
    )
}

async fn find_batch(state: &AppState, id: &str) -> Result<Arc<Batch>, ApiError> {
    state
        .batch(id)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Batch not found: {}", id)))
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a batch from a multipart upload.
///
/// Every part with a file name becomes one input file, in upload order.
/// Parts whose content type is neither audio nor image are skipped and
/// listed under `rejected`; the upload fails only when nothing is left.
pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreateBatchResponse>), ApiError> {
    let mut files = Vec::new();
    let mut rejected = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(e.status(), e.body_text()))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| api_error(e.status(), e.body_text()))?;

        match InputFile::from_upload(name.clone(), &content_type, bytes.to_vec()) {
            Ok(input) => files.push(input),
            Err(e) => {
                warn!(file = %name, content_type = %content_type, "Rejected upload: {}", e);
                rejected.push(RejectedFile {
                    name,
                    content_type,
                    error: e.to_string(),
                });
            }
        }
    }

    if files.is_empty() {
        let error = match rejected.as_slice() {
            [] => "No files uploaded".to_string(),
            parts => parts
                .iter()
                .map(|r| r.error.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        };
        return Err(api_error(StatusCode::BAD_REQUEST, error));
    }

    let batch: Arc<Batch> = Arc::new(BatchPipeline::new(
        state.config().batch.clone(),
        state.client(),
        files,
    ));
    state.insert_batch(Arc::clone(&batch)).await;
    BATCHES_CREATED_TOTAL.inc();

    let response = BatchResponse::from_batch(&batch).await;
    info!(
        batch_id = %response.id,
        files = response.summary.total,
        rejected = rejected.len(),
        "Batch created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateBatchResponse {
            batch: response,
            rejected,
        }),
    ))
}

/// List all batches
pub async fn list_batches(State(state): State<Arc<AppState>>) -> Json<ListBatchesResponse> {
    let mut batches = Vec::new();
    for batch in state.batches().await {
        batches.push(BatchListItem {
            id: batch.id().to_string(),
            started: batch.is_started(),
            summary: batch.summary().await,
        });
    }

    Json(ListBatchesResponse {
        total: batches.len(),
        batches,
    })
}

/// Get a batch by ID
pub async fn get_batch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BatchResponse>, ApiError> {
    let batch = find_batch(&state, &id).await?;
    Ok(Json(BatchResponse::from_batch(&batch).await))
}

/// Start processing a batch in the background
pub async fn start_batch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<BatchActionResponse>), ApiError> {
    let batch = find_batch(&state, &id).await?;

    // Subscribe before starting so no event is missed
    let events = batch.subscribe();

    match batch.spawn() {
        Ok(_handle) => {
            forward_batch_events(id.clone(), events, state.ws_broadcaster().clone());
            info!(batch_id = %id, "Batch started");
            Ok((
                StatusCode::ACCEPTED,
                Json(BatchActionResponse {
                    id,
                    summary: batch.summary().await,
                }),
            ))
        }
        Err(BatchError::AlreadyStarted) => Err(api_error(
            StatusCode::CONFLICT,
            format!("Batch already started: {}", id),
        )),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// Cancel the files of a batch that have not started yet
pub async fn cancel_batch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<BatchActionResponse>), ApiError> {
    let batch = find_batch(&state, &id).await?;
    batch.cancel();
    info!(batch_id = %id, "Batch cancellation requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(BatchActionResponse {
            id,
            summary: batch.summary().await,
        }),
    ))
}

/// Cancel a batch and drop it, releasing its inputs and artifacts
pub async fn delete_batch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let batch = state
        .remove_batch(&id)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Batch not found: {}", id)))?;
    batch.cancel();
    info!(batch_id = %id, "Batch deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Download the converted artifact of one file
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path((id, file_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let batch = find_batch(&state, &id).await?;
    let file = batch.artifact(&file_id).await.ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("No converted artifact for file: {}", file_id),
        )
    })?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        file.file_name.replace(['"', '\\'], "_")
    );

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.clone()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(file.bytes.to_vec()),
    )
        .into_response())
}

/// Export every completed artifact of a batch to the export directory
pub async fn export_batch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ExportResponse>, ApiError> {
    let batch = find_batch(&state, &id).await?;
    let dir = state.config().export.dir.join(batch.id());
    let sink = DirectoryExportSink::new(&dir);

    let files = batch.download_all(&sink).await.map_err(|e| {
        warn!(batch_id = %id, "Export failed: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(ExportResponse {
        id,
        dir: dir.display().to_string(),
        files,
    }))
}
