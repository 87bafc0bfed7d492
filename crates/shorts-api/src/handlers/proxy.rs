//! Media proxy and waveform handlers.
//!
//! The editor can't fetch cross-origin media directly, so the server
//! fetches on its behalf: remote audio is streamed straight through,
//! stored video is served with Range support, and waveforms are computed
//! here instead of shipping the whole file to the browser.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use shorts_media::DEFAULT_SAMPLE_COUNT;
use tracing::warn;
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security;
use crate::state::AppState;

/// Upper bound on requested waveform resolution.
const MAX_SAMPLE_COUNT: usize = 1000;

// ============================================================================
// Audio Proxy
// ============================================================================

/// Audio proxy query parameters.
#[derive(Debug, Deserialize)]
pub struct AudioProxyQuery {
    pub url: Option<String>,
}

/// Fetch remote audio server-side and stream it back.
pub async fn audio_proxy(
    State(state): State<AppState>,
    Query(query): Query<AudioProxyQuery>,
) -> ApiResult<Response> {
    let url = query
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing url parameter"))?;

    let url = security::validate_proxy_url(&url)
        .into_result()
        .map_err(ApiError::BadRequest)?;

    let response = state
        .http
        .get(&url)
        .send()
        .await
        .map_err(|e| ApiError::upstream(None, format!("Failed to fetch audio: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::upstream(
            Some(status.as_u16()),
            format!("Failed to fetch audio: {}", status),
        ));
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("audio/mpeg")
        .to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Body::from_stream(response.bytes_stream()))
        .map_err(|e| ApiError::internal(e.to_string()))
}

// ============================================================================
// Video Proxy
// ============================================================================

/// Video proxy query parameters.
#[derive(Debug, Deserialize)]
pub struct VideoProxyQuery {
    pub key: Option<String>,
    pub url: Option<String>,
    pub download: Option<String>,
}

/// Resolve the object key from the query: an explicit key, or the path of
/// a bucket URL.
fn resolve_key(query: &VideoProxyQuery) -> Option<String> {
    let mut key = query.key.clone().filter(|k| !k.is_empty());

    if let Some(u) = query.url.as_deref().filter(|u| !u.is_empty()) {
        match Url::parse(u) {
            Ok(parsed) => key = Some(parsed.path().trim_start_matches('/').to_string()),
            Err(e) => warn!("Failed to parse url parameter: {}", e),
        }
    }

    key.filter(|k| !k.is_empty())
}

/// Stream a stored object, honoring Range requests for playback and
/// forcing a download when asked.
pub async fn video_proxy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<VideoProxyQuery>,
) -> ApiResult<Response> {
    let key =
        resolve_key(&query).ok_or_else(|| ApiError::bad_request("Key or URL is required"))?;

    if !security::is_safe_object_key(&key) {
        return Err(ApiError::bad_request("Invalid key"));
    }

    let is_download = query.download.as_deref() == Some("true");
    let range = if is_download {
        None
    } else {
        headers.get(header::RANGE).and_then(|v| v.to_str().ok())
    };

    let storage = state.storage()?;
    let object = storage.get_object_range(&key, range).await?;

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, object.content_type)
        .header(header::CONTENT_LENGTH, object.content_length)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::CACHE_CONTROL, "public, max-age=3600");

    if is_download {
        builder = builder
            .status(StatusCode::OK)
            .header(
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"export.mp4\"",
            );
    } else {
        builder = builder
            .header(header::CONTENT_DISPOSITION, "inline")
            .header(header::ACCEPT_RANGES, "bytes");

        builder = match object.content_range {
            Some(content_range) => builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_RANGE, content_range),
            None => builder.status(StatusCode::OK),
        };
    }

    builder
        .body(Body::from(object.bytes))
        .map_err(|e| ApiError::internal(e.to_string()))
}

// ============================================================================
// Waveform Peaks
// ============================================================================

/// Waveform query parameters.
#[derive(Debug, Deserialize)]
pub struct AudioPeaksQuery {
    pub url: Option<String>,
    pub samples: Option<usize>,
}

/// Waveform response.
#[derive(Serialize)]
pub struct AudioPeaksResponse {
    pub peaks: Vec<f32>,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Compute a peak envelope for a remote audio file.
///
/// Extraction failures degrade to an all-zero envelope with the cause in
/// the response, so the editor can always draw something.
pub async fn audio_peaks(
    State(state): State<AppState>,
    Query(query): Query<AudioPeaksQuery>,
) -> ApiResult<Json<AudioPeaksResponse>> {
    let url = query
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing url parameter"))?;

    let url = security::validate_proxy_url(&url)
        .into_result()
        .map_err(ApiError::BadRequest)?;

    let samples = query.samples.unwrap_or(DEFAULT_SAMPLE_COUNT);
    if samples == 0 || samples > MAX_SAMPLE_COUNT {
        return Err(ApiError::bad_request("Invalid sample count"));
    }

    let envelope = state.peaks.extract_peaks(&url, samples).await;
    metrics::record_peak_extraction(envelope.is_degraded());

    Ok(Json(AudioPeaksResponse {
        degraded: envelope.is_degraded(),
        error: envelope.failure.map(|e| e.to_string()),
        peaks: envelope.peaks,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_key_prefers_url_path() {
        let query = VideoProxyQuery {
            key: Some("uploads/a.mp4".to_string()),
            url: Some("https://pub-abc.r2.dev/static/previews/puck.mp3".to_string()),
            download: None,
        };
        assert_eq!(
            resolve_key(&query).as_deref(),
            Some("static/previews/puck.mp3")
        );
    }

    #[test]
    fn test_resolve_key_falls_back_on_bad_url() {
        let query = VideoProxyQuery {
            key: Some("uploads/a.mp4".to_string()),
            url: Some("not a url".to_string()),
            download: None,
        };
        assert_eq!(resolve_key(&query).as_deref(), Some("uploads/a.mp4"));
    }

    #[test]
    fn test_resolve_key_requires_something() {
        let query = VideoProxyQuery {
            key: None,
            url: None,
            download: None,
        };
        assert_eq!(resolve_key(&query), None);
    }
}
