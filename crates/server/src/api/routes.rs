use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{handlers, upload};
use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit =
        usize::try_from(state.config().limits.max_file_size).unwrap_or(usize::MAX)
            .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/api/config", get(handlers::get_config))
        .route("/api/echo", post(handlers::echo))
        // Upload workflow
        .route(
            "/api/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/result", get(upload::check_result))
        // Signed downloads
        .route("/files/{bucket}/{name}", get(upload::download))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
