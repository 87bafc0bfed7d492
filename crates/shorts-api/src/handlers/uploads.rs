//! Upload ticket and batch deletion handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use shorts_models::UploadTicket;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Prefix every direct upload lands under.
const UPLOAD_PREFIX: &str = "uploads";

/// S3 DeleteObjects takes at most 1000 keys per call.
pub(crate) const DELETE_BATCH_SIZE: usize = 1000;

/// Upload ticket request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content_type: String,
}

/// Issue an upload ticket: a presigned PUT URL plus a read URL for
/// immediate playback.
pub async fn request_upload(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> ApiResult<Json<UploadTicket>> {
    if request.filename.is_empty() || request.content_type.is_empty() {
        return Err(ApiError::bad_request(
            "Filename and content type are required",
        ));
    }

    let storage = state.storage()?;
    let ticket = storage
        .request_upload(
            &state.tickets,
            &request.filename,
            &request.content_type,
            UPLOAD_PREFIX,
            None,
        )
        .await?;

    metrics::record_upload_ticket();

    Ok(Json(ticket))
}

/// Batch deletion request.
#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Batch deletion response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub success: bool,
    pub deleted_count: u32,
}

/// Delete a batch of objects the client is done with.
pub async fn cleanup(
    State(state): State<AppState>,
    Json(request): Json<CleanupRequest>,
) -> ApiResult<Json<CleanupResponse>> {
    if request.keys.is_empty() {
        return Err(ApiError::bad_request("No keys provided"));
    }

    info!("Cleanup: deleting {} objects", request.keys.len());

    let storage = state.storage()?;
    let mut deleted_count = 0;
    for chunk in request.keys.chunks(DELETE_BATCH_SIZE) {
        deleted_count += storage.delete_objects(chunk).await?;
    }

    metrics::record_objects_deleted("cleanup", deleted_count as u64);
    info!("Cleanup: {} objects deleted", deleted_count);

    Ok(Json(CleanupResponse {
        success: true,
        deleted_count,
    }))
}
