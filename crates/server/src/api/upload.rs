//! Upload, result and download endpoints.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use bookopt_core::backend::{problem_id_from_value, ResultResponse, UploadResponse};
use bookopt_core::file::guess_media_type;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;
use crate::storage::{StorageError, StoredName};

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub expires: i64,
    pub signature: String,
}

fn storage_error(e: StorageError) -> ApiError {
    match e {
        StorageError::InvalidName(_) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        StorageError::UnknownBucket(_) | StorageError::NotFound { .. } => {
            api_error(StatusCode::NOT_FOUND, e.to_string())
        }
        StorageError::Io(_) => {
            error!(error = %e, "Storage failure");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure")
        }
    }
}

fn problem_id_of(document: &Value) -> Option<String> {
    document.get("ProblemId").and_then(problem_id_from_value)
}

// ============================================================================
// Handlers
// ============================================================================

/// Accept one JSON document as multipart field `file`.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(e.status(), format!("Invalid multipart body: {}", e.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| api_error(e.status(), format!("Failed to read file: {}", e.body_text())))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (original_name, contents) = upload
        .ok_or_else(|| api_error(StatusCode::UNPROCESSABLE_ENTITY, "Missing file field"))?;

    let document: Value = serde_json::from_slice(&contents).map_err(|e| {
        warn!(file = %original_name, error = %e, "Rejected upload with invalid JSON");
        api_error(StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", e))
    })?;
    let problem_id = problem_id_of(&document);

    let stored = StoredName::generate(&original_name);
    let file_name = stored.upload_name();
    let store = state.store();
    store
        .put(store.json_bucket(), &file_name, &contents)
        .await
        .map_err(storage_error)?;

    info!(
        original = %original_name,
        stored = %file_name,
        problem_id = problem_id.as_deref().unwrap_or("-"),
        "Accepted upload"
    );

    Ok(Json(UploadResponse {
        file_name,
        problem_id,
    }))
}

/// Report whether the artifacts of an upload exist yet.
pub async fn check_result(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResultQuery>,
) -> Result<Json<ResultResponse>, ApiError> {
    let stored = StoredName::parse(&query.file_name).map_err(|e| {
        warn!(file_name = %query.file_name, error = %e, "Rejected result query");
        api_error(StatusCode::BAD_REQUEST, e.to_string())
    })?;

    let store = state.store();
    let plotted = stored.plotted_name();
    if !store
        .exists(store.plotted_bucket(), &plotted)
        .await
        .map_err(storage_error)?
    {
        return Ok(Json(ResultResponse::default()));
    }

    let problem_id = match store.get(store.json_bucket(), &query.file_name).await {
        Ok(contents) => match serde_json::from_slice::<Value>(&contents) {
            Ok(document) => problem_id_of(&document),
            Err(e) => {
                warn!(file_name = %query.file_name, error = %e, "Stored upload is not valid JSON");
                None
            }
        },
        Err(e) => {
            warn!(file_name = %query.file_name, error = %e, "Stored upload unavailable");
            None
        }
    };

    let now = Utc::now();
    let base_url = state.public_base_url();
    let signer = state.signer();
    let json_url = signer.sign(&base_url, store.optimized_bucket(), &stored.optimized_name(), now);
    let image_url = signer.sign(&base_url, store.plotted_bucket(), &plotted, now);

    info!(file_name = %query.file_name, "Result ready");

    Ok(Json(ResultResponse {
        ready: true,
        json_url: Some(json_url),
        image_url: Some(image_url),
        expires_in_minutes: Some(u64::from(signer.ttl_minutes())),
        problem_id,
    }))
}

/// Serve a blob behind a signed link.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path((bucket, name)): Path<(String, String)>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    state
        .signer()
        .verify(&bucket, &name, query.expires, &query.signature, Utc::now())
        .map_err(|e| {
            warn!(bucket = %bucket, name = %name, error = %e, "Refused download");
            api_error(StatusCode::FORBIDDEN, e.to_string())
        })?;

    let data = state
        .store()
        .get(&bucket, &name)
        .await
        .map_err(storage_error)?;

    Ok(([(header::CONTENT_TYPE, guess_media_type(&name))], data).into_response())
}
