//! Project document handlers.
//!
//! The editor keeps its working state (latest analysis, imported assets)
//! in a single server-side document so a reload or crash never loses the
//! session. All reads and writes go through the [`ProjectStore`].

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use shorts_models::{ImportedAsset, ProjectData, ProjectPatch};
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

/// Response for a project reset.
#[derive(Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub project: ProjectData,
}

/// Return the current project document.
pub async fn get_project(State(state): State<AppState>) -> Json<ProjectData> {
    Json(state.project.get().await)
}

/// Merge a partial update into the project document.
///
/// Absent fields keep their values; an empty patch is a no-op that still
/// returns the current document.
pub async fn update_project(
    State(state): State<AppState>,
    Json(patch): Json<ProjectPatch>,
) -> ApiResult<Json<ProjectData>> {
    let updated = state.project.update(patch).await?;
    Ok(Json(updated))
}

/// Reset the project document and delete its backing file.
pub async fn clear_project(State(state): State<AppState>) -> ApiResult<Json<ClearResponse>> {
    let project = state.project.clear().await?;
    info!("Project document cleared");
    Ok(Json(ClearResponse {
        success: true,
        project,
    }))
}

/// Record one imported asset on the project document.
pub async fn add_asset(
    State(state): State<AppState>,
    Json(asset): Json<ImportedAsset>,
) -> ApiResult<Json<ProjectData>> {
    let updated = state.project.append_asset(asset).await?;
    Ok(Json(updated))
}
