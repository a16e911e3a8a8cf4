use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{batches, handlers, middleware::metrics_middleware, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config().server.max_upload_bytes();

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Batches
        .route("/batches", post(batches::create_batch))
        .route("/batches", get(batches::list_batches))
        .route(
            "/batches/{id}",
            get(batches::get_batch).delete(batches::delete_batch),
        )
        .route("/batches/{id}/start", post(batches::start_batch))
        .route("/batches/{id}/cancel", post(batches::cancel_batch))
        .route(
            "/batches/{id}/files/{file_id}/download",
            get(batches::download_file),
        )
        .route("/batches/{id}/export", post(batches::export_batch))
        // Real-time updates
        .route("/ws", get(ws::ws_handler))
        .layer(DefaultBodyLimit::max(upload_limit));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
