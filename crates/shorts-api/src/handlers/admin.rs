//! Scheduled maintenance handlers.

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::handlers::uploads::DELETE_BATCH_SIZE;
use crate::metrics;
use crate::state::AppState;

/// Objects older than this are eligible for scheduled deletion.
const RETENTION_HOURS: i64 = 24;

/// Scheduled cleanup report.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronCleanupResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: u32,
}

/// Check the bearer token the scheduler sends against `CRON_SECRET`.
///
/// Without a configured secret the endpoint refuses to run in
/// production; in development it runs open so the job can be exercised
/// locally.
fn authorize_cron(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match state.config.cron_secret.as_deref() {
        Some(secret) => {
            let expected = format!("Bearer {}", secret);
            if presented == Some(expected.as_str()) {
                Ok(())
            } else {
                Err(ApiError::unauthorized("Unauthorized"))
            }
        }
        None if state.config.is_production() => Err(ApiError::unauthorized("Unauthorized")),
        None => {
            warn!("CRON_SECRET not set; allowing unauthenticated cleanup in development");
            Ok(())
        }
    }
}

/// Whether a stored object is exempt from scheduled deletion.
///
/// Stock footage and prefix placeholder entries never age out.
fn is_protected_key(key: &str) -> bool {
    key.starts_with("stock/") || key.contains("/stock/") || key.ends_with('/')
}

/// Delete uploads and render outputs older than the retention window.
///
/// Invoked by the platform scheduler. Objects without a last-modified
/// timestamp are kept.
pub async fn cron_cleanup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<CronCleanupResponse>> {
    authorize_cron(&state, &headers)?;

    let storage = state.storage()?;
    let objects = storage.list_objects("").await?;
    let scanned = objects.len();

    let cutoff_ms = chrono::Utc::now().timestamp_millis() - RETENTION_HOURS * 3600 * 1000;
    let stale: Vec<String> = objects
        .into_iter()
        .filter(|o| !is_protected_key(&o.key))
        .filter(|o| {
            o.last_modified
                .map(|ms| (ms as i64) < cutoff_ms)
                .unwrap_or(false)
        })
        .map(|o| o.key)
        .collect();

    let mut deleted_count = 0;
    for chunk in stale.chunks(DELETE_BATCH_SIZE) {
        deleted_count += storage.delete_objects(chunk).await?;
    }

    metrics::record_objects_deleted("cron", deleted_count as u64);
    info!(
        "Scheduled cleanup: scanned {} objects, deleted {}",
        scanned, deleted_count
    );

    Ok(Json(CronCleanupResponse {
        success: true,
        message: format!(
            "Cleanup complete. Scanned {} files, deleted {} files older than {}h.",
            scanned, deleted_count, RETENTION_HOURS
        ),
        deleted_count,
    }))
}
