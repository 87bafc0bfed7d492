//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Which services this deployment has credentials for. Values are presence
/// flags only, never the secrets themselves.
#[derive(Serialize)]
pub struct EnvironmentCheck {
    #[serde(rename = "GEMINI_API_KEY")]
    pub gemini_api_key: bool,
    #[serde(rename = "R2_ACCOUNT_ID")]
    pub r2_account_id: bool,
    #[serde(rename = "R2_ACCESS_KEY_ID")]
    pub r2_access_key_id: bool,
    #[serde(rename = "R2_SECRET_ACCESS_KEY")]
    pub r2_secret_access_key: bool,
    #[serde(rename = "R2_BUCKET_NAME")]
    pub r2_bucket_name: bool,
    #[serde(rename = "MODAL_SUBTITLES_URL")]
    pub modal_subtitles_url: bool,
    #[serde(rename = "MODAL_RENDER_URL")]
    pub modal_render_url: bool,
}

/// Service status response.
#[derive(Serialize)]
pub struct ServiceStatusResponse {
    pub status: String,
    pub environment_check: EnvironmentCheck,
    pub timestamp: String,
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

/// Service status endpoint: reports which integrations are configured.
pub async fn service_status() -> Json<ServiceStatusResponse> {
    Json(ServiceStatusResponse {
        status: "online".to_string(),
        environment_check: EnvironmentCheck {
            gemini_api_key: env_flag("GEMINI_API_KEY") || env_flag("GOOGLE_API_KEY"),
            r2_account_id: env_flag("R2_ACCOUNT_ID"),
            r2_access_key_id: env_flag("R2_ACCESS_KEY_ID"),
            r2_secret_access_key: env_flag("R2_SECRET_ACCESS_KEY"),
            r2_bucket_name: env_flag("R2_BUCKET_NAME"),
            modal_subtitles_url: env_flag("MODAL_SUBTITLES_URL"),
            modal_render_url: env_flag("MODAL_RENDER_URL"),
        },
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub storage: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckStatus {
    fn ok(latency_ms: u64) -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
            latency_ms: Some(latency_ms),
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
            latency_ms: None,
        }
    }
}

/// Readiness check endpoint (readiness probe).
/// Checks connectivity to the storage bucket.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    use std::time::Instant;

    let storage_check = match state.storage.as_ref() {
        Some(storage) => {
            let start = Instant::now();
            match storage.check_connectivity().await {
                Ok(_) => CheckStatus::ok(start.elapsed().as_millis() as u64),
                Err(e) => CheckStatus::error(e.to_string()),
            }
        }
        None => CheckStatus::error("Storage not configured"),
    };

    let all_ok = storage_check.status == "ok";

    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks: ReadinessChecks {
            storage: storage_check,
        },
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
