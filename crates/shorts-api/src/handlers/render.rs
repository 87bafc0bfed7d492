//! Render orchestration handlers.
//!
//! These routes front the Modal render backend: kick off full processing of
//! an uploaded video, submit editor timelines for rendering or subtitle
//! generation, and poll for results. Results land in the bucket next to the
//! derived output key, so status checks are bucket probes rather than
//! backend calls.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use shorts_render::{derive_output_key, OutputProbe, RenderError};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security;
use crate::state::AppState;

// ============================================================================
// Submissions
// ============================================================================

/// Full-processing request.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub key: String,
}

/// Kick off full processing of an uploaded video.
pub async fn process(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> ApiResult<Json<Value>> {
    if request.key.is_empty() {
        return Err(ApiError::bad_request("Missing key"));
    }
    if !security::is_safe_object_key(&request.key) {
        return Err(ApiError::bad_request("Invalid key"));
    }

    let submission = state.render.submit_process(&request.key).await?;
    metrics::record_render_submission("process");

    info!(
        "Processing submitted for {}, output key {}",
        request.key, submission.output_key
    );

    Ok(Json(submission.ack))
}

/// Submit an editor timeline for rendering.
pub async fn render_timeline(
    State(state): State<AppState>,
    Json(payload): Json<Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    if !payload.contains_key("video_tracks") && !payload.contains_key("audio_tracks") {
        return Err(ApiError::bad_request("No tracks provided"));
    }

    let ack = state.render.submit_timeline(payload).await?;
    metrics::record_render_submission("timeline");

    Ok(Json(ack))
}

/// Submit an editor timeline for subtitle generation.
///
/// The subtitle backend's own status code is passed through so the editor
/// can distinguish a rejected timeline from an unreachable backend.
pub async fn subtitles(
    State(state): State<AppState>,
    Json(payload): Json<Map<String, Value>>,
) -> ApiResult<Response> {
    if !payload.contains_key("video_tracks") && !payload.contains_key("audio_tracks") {
        return Err(ApiError::bad_request("No tracks provided"));
    }

    match state.render.submit_subtitles(payload).await {
        Ok(ack) => {
            metrics::record_render_submission("subtitles");
            Ok(Json(ack).into_response())
        }
        Err(RenderError::Upstream { status, message }) => {
            warn!("Subtitle backend rejected timeline with {}", status);
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            let body = json!({ "error": format!("Modal Error {}: {}", status, message) });
            Ok((code, Json(body)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Polling
// ============================================================================

/// Poll query parameters.
#[derive(Debug, Deserialize)]
pub struct PollQuery {
    pub url: Option<String>,
}

/// Probe a render output URL once.
///
/// `.json` URLs are status files and their parsed body is returned on
/// success. Anything else just gets an existence check. A missing output is
/// 404 `pending` so pollers can key off the status code alone.
pub async fn poll_render(
    State(state): State<AppState>,
    Query(query): Query<PollQuery>,
) -> ApiResult<Response> {
    let url = query
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("URL is required"))?;

    let url = security::validate_proxy_url(&url)
        .into_result()
        .map_err(ApiError::BadRequest)?;

    let probe = state.render.probe_output(&url).await;

    let response = match probe {
        OutputProbe::Ready { body: Some(body) } => {
            metrics::record_render_poll("ready");
            Json(body).into_response()
        }
        OutputProbe::Ready { body: None } => {
            metrics::record_render_poll("ready");
            Json(json!({ "status": "ready" })).into_response()
        }
        OutputProbe::Pending => {
            metrics::record_render_poll("pending");
            (StatusCode::NOT_FOUND, Json(json!({ "status": "pending" }))).into_response()
        }
        OutputProbe::Error { message } => {
            metrics::record_render_poll("error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": message })),
            )
                .into_response()
        }
    };

    Ok(response)
}

// ============================================================================
// Status
// ============================================================================

/// Status query parameters.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub key: Option<String>,
}

/// Bucket key of the result document for a source key.
fn result_key_for(source_key: &str) -> String {
    let output_key = derive_output_key(source_key);
    match output_key.rfind('.') {
        Some(i) => format!("{}_result.json", &output_key[..i]),
        None => format!("{}_result.json", output_key),
    }
}

/// File stem of the last path component, used for marker documents.
fn marker_stem(source_key: &str) -> &str {
    let name = source_key.rsplit('/').next().unwrap_or(source_key);
    name.split('.').next().unwrap_or(name)
}

/// Report processing status by probing the bucket for result, error and
/// started markers, in that order.
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Response> {
    let key = query
        .key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::bad_request("Key is required"))?;

    if !security::is_safe_object_key(&key) {
        return Err(ApiError::bad_request("Invalid key"));
    }

    let storage = state.storage()?;

    // Result document wins
    let result_key = result_key_for(&key);
    match storage.download_bytes(&result_key).await {
        Ok(bytes) => {
            if let Ok(body) = serde_json::from_slice::<Value>(&bytes) {
                return Ok(Json(body).into_response());
            }
            warn!("Unreadable result document at {}", result_key);
        }
        Err(shorts_storage::StorageError::NotFound(_)) => {}
        Err(e) => warn!("Error checking result document {}: {}", result_key, e),
    }

    // Error marker
    let stem = marker_stem(&key);
    let error_key = format!("processed/{}_error.json", stem);
    if let Ok(bytes) = storage.download_bytes(&error_key).await {
        let detail = serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String("Unknown error".to_string()));
        return Ok(Json(json!({ "status": "failed", "error": detail })).into_response());
    }

    // Started marker
    let processing_key = format!("processed/{}_started.json", stem);
    if storage.download_bytes(&processing_key).await.is_ok() {
        return Ok(Json(json!({ "status": "processing" })).into_response());
    }

    // Nothing in the bucket yet
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "processing" })),
    )
        .into_response())
}
