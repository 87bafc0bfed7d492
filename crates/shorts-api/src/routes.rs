//! API routes.

use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::admin::cron_cleanup;
use crate::handlers::history::history;
use crate::handlers::project::{add_asset, clear_project, get_project, update_project};
use crate::handlers::proxy::{audio_peaks, audio_proxy, video_proxy};
use crate::handlers::render::{poll_render, process, render_timeline, status, subtitles};
use crate::handlers::scripts::{chat_script, enhance_prompt, generate_script, refine_script};
use crate::handlers::settings::{get_settings, update_settings};
use crate::handlers::tts::synthesize;
use crate::handlers::uploads::{cleanup, request_upload};
use crate::handlers::{health, ready, service_status};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let storage_routes = Router::new()
        // Presigned upload tickets
        .route("/upload", post(request_upload))
        // Client-driven batch deletion
        .route("/cleanup", post(cleanup));

    let script_routes = Router::new()
        .route("/generate-script", post(generate_script))
        .route("/refine-script", post(refine_script))
        .route("/ai-chat", post(chat_script))
        .route("/enhance-prompt", post(enhance_prompt))
        .route("/tts", post(synthesize));

    // Render pipeline: submit, then poll either the worker's output URL
    // or the bucket markers.
    let render_routes = Router::new()
        .route("/process", post(process))
        .route("/render", post(render_timeline))
        .route("/subtitles", post(subtitles))
        .route("/poll-render", get(poll_render))
        .route("/status", get(status));

    let media_routes = Router::new()
        .route("/audio-proxy", get(audio_proxy))
        .route("/audio-peaks", get(audio_peaks))
        .route("/video-proxy", get(video_proxy));

    let project_routes = Router::new()
        .route("/project", get(get_project))
        .route("/project", patch(update_project))
        .route("/project", delete(clear_project))
        .route("/project/assets", post(add_asset));

    let settings_routes = Router::new()
        .route("/settings", get(get_settings))
        .route("/settings", post(update_settings));

    let misc_routes = Router::new()
        .route("/history", get(history))
        // Configuration probe used by the editor's status panel
        .route("/health", get(service_status))
        // Scheduled maintenance, bearer-token guarded
        .route("/cron/cleanup", get(cron_cleanup));

    // Create rate limiter for API routes
    let rate_limiter = std::sync::Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(storage_routes)
        .merge(script_routes)
        .merge(render_routes)
        .merge(media_routes)
        .merge(project_routes)
        .merge(settings_routes)
        .merge(misc_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // SECURITY: Request body size limit to prevent DoS attacks
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
