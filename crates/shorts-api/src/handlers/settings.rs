//! User settings handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

/// Settings payload, wire-shaped for the editor.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPayload {
    pub lite_mode: bool,
}

/// Return the persisted settings.
pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsPayload> {
    let prefs = state.prefs.get().await;
    Json(SettingsPayload {
        lite_mode: prefs.lite_mode,
    })
}

/// Update and persist settings.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<SettingsPayload>,
) -> ApiResult<Json<SettingsPayload>> {
    let prefs = state.prefs.set_lite_mode(payload.lite_mode).await?;
    info!("Settings updated: lite_mode={}", prefs.lite_mode);
    Ok(Json(SettingsPayload {
        lite_mode: prefs.lite_mode,
    }))
}
