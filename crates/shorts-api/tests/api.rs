//! API integration tests.
//!
//! These run the real router against a temp data directory, with no
//! storage or generation credentials configured. That covers the full
//! middleware stack, request validation, the project and settings
//! stores, and the mock render fallbacks. Anything needing live
//! credentials is exercised at the crate level with mock servers
//! instead.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use shorts_api::{create_router, ApiConfig, AppState};

async fn test_app() -> (Router, TempDir) {
    test_app_with(|_| {}).await
}

async fn test_app_with(configure: impl FnOnce(&mut ApiConfig)) -> (Router, TempDir) {
    let dir = TempDir::new().expect("tempdir");
    let mut config = ApiConfig {
        data_dir: dir.path().to_path_buf(),
        rate_limit_rps: 1000,
        ..ApiConfig::default()
    };
    configure(&mut config);

    let state = AppState::new(config).await.expect("app state");
    (create_router(state, None), dir)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = test_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_readiness_degrades_without_storage() {
    if std::env::var("R2_ACCOUNT_ID").is_ok() {
        return; // real credentials present, readiness would pass
    }
    let (app, _dir) = test_app().await;

    let response = app.oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["storage"]["status"], "error");
}

#[tokio::test]
async fn test_service_status_reports_configuration() {
    let (app, _dir) = test_app().await;

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "online");
    let checks = body["environment_check"].as_object().unwrap();
    for key in [
        "GEMINI_API_KEY",
        "R2_ACCOUNT_ID",
        "R2_BUCKET_NAME",
        "MODAL_RENDER_URL",
    ] {
        assert!(checks[key].is_boolean(), "missing flag {}", key);
    }
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let (app, _dir) = test_app().await;

    let request = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "test-trace-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-request-id"], "test-trace-42");
}

#[tokio::test]
async fn test_upload_requires_filename_and_content_type() {
    let (app, _dir) = test_app().await;

    let response = app
        .oneshot(send_json("POST", "/api/upload", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Filename and content type are required");
}

#[tokio::test]
async fn test_upload_without_storage_is_config_error() {
    if std::env::var("R2_ACCOUNT_ID").is_ok() {
        return;
    }
    let (app, _dir) = test_app().await;

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/upload",
            json!({"filename": "clip.mp4", "contentType": "video/mp4"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Storage not configured");
}

#[tokio::test]
async fn test_cleanup_requires_keys() {
    let (app, _dir) = test_app().await;

    let response = app
        .oneshot(send_json("POST", "/api/cleanup", json!({"keys": []})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "No keys provided");
}

#[tokio::test]
async fn test_generate_script_rejects_blank_prompt() {
    let (app, _dir) = test_app().await;

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/generate-script",
            json!({"prompt": "   "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_script_without_key_is_config_error() {
    if std::env::var("GEMINI_API_KEY").is_ok() || std::env::var("GOOGLE_API_KEY").is_ok() {
        return; // a real key would trigger a live call
    }
    let (app, _dir) = test_app().await;

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/generate-script",
            json!({"prompt": "a cat that learns to skateboard"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing API Key");
}

#[tokio::test]
async fn test_render_requires_tracks() {
    let (app, _dir) = test_app().await;

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/render",
            json!({"output_key": "processed/final.mp4"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "No tracks provided");
}

#[tokio::test]
async fn test_render_returns_mock_ack_without_backend() {
    if std::env::var("MODAL_RENDER_URL").is_ok() {
        return;
    }
    let (app, _dir) = test_app().await;

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/render",
            json!({
                "video_tracks": [],
                "audio_tracks": [],
                "output_key": "processed/final.mp4"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "mock_success");
    assert!(body["call_id"].as_str().unwrap().starts_with("mock-call-id-"));
}

#[tokio::test]
async fn test_subtitles_return_mock_cues_without_backend() {
    if std::env::var("MODAL_SUBTITLES_URL").is_ok() {
        return;
    }
    let (app, _dir) = test_app().await;

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/subtitles",
            json!({"video_tracks": [{"url": "https://example.com/a.mp4"}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "mock_success");
    let cues = body["subtitles"].as_array().unwrap();
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0]["text"], "Mock Subtitle 1");
}

#[tokio::test]
async fn test_poll_render_requires_url() {
    let (app, _dir) = test_app().await;

    let response = app.oneshot(get("/api/poll-render")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "URL is required");
}

#[tokio::test]
async fn test_poll_render_rejects_internal_hosts() {
    let (app, _dir) = test_app().await;

    let response = app
        .oneshot(get(
            "/api/poll-render?url=http://169.254.169.254/latest/meta-data",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_validates_key() {
    let (app, _dir) = test_app().await;

    let response = app.clone().oneshot(get("/api/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Key is required");

    let response = app
        .oneshot(get("/api/status?key=../../etc/passwd"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid key");
}

#[tokio::test]
async fn test_audio_proxy_requires_url() {
    let (app, _dir) = test_app().await;

    let response = app.oneshot(get("/api/audio-proxy")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing url parameter");
}

#[tokio::test]
async fn test_audio_proxy_blocks_loopback() {
    let (app, _dir) = test_app().await;

    let response = app
        .oneshot(get("/api/audio-proxy?url=http://127.0.0.1:9000/x.mp3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_audio_peaks_validates_input() {
    let (app, _dir) = test_app().await;

    let response = app.clone().oneshot(get("/api/audio-peaks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get(
            "/api/audio-peaks?url=https://example.com/a.mp3&samples=100000",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid sample count");
}

#[tokio::test]
async fn test_video_proxy_requires_key_or_url() {
    let (app, _dir) = test_app().await;

    let response = app.oneshot(get("/api/video-proxy")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Key or URL is required");
}

#[tokio::test]
async fn test_history_without_storage_is_config_error() {
    if std::env::var("R2_ACCOUNT_ID").is_ok() {
        return;
    }
    let (app, _dir) = test_app().await;

    let response = app.oneshot(get("/api/history")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Storage not configured");
}

#[tokio::test]
async fn test_project_lifecycle() {
    let (app, _dir) = test_app().await;

    // Fresh project
    let response = app.clone().oneshot(get("/api/project")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["analysis_result"].is_null());
    assert_eq!(body["imported_assets"], json!([]));

    // Save an analysis result
    let patch = json!({
        "analysis_result": {
            "virality_score": 83,
            "script": [{"time": "00:00-00:05", "text": "Open strong", "visual": "close-up"}]
        }
    });
    let response = app
        .clone()
        .oneshot(send_json("PATCH", "/api/project", patch))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["analysis_result"]["virality_score"], 83.0);

    // Record an imported asset; editor extras survive
    let asset = json!({
        "key": "uploads/voiceover-1.wav",
        "content_type": "audio/wav",
        "name": "take 2"
    });
    let response = app
        .clone()
        .oneshot(send_json("POST", "/api/project/assets", asset))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["imported_assets"][0]["key"], "uploads/voiceover-1.wav");
    assert_eq!(body["imported_assets"][0]["name"], "take 2");
    assert_eq!(body["analysis_result"]["virality_score"], 83.0);

    // Reset
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/project")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let response = app.oneshot(get("/api/project")).await.unwrap();
    let body = body_json(response).await;
    assert!(body["analysis_result"].is_null());
}

#[tokio::test]
async fn test_settings_roundtrip() {
    let (app, _dir) = test_app().await;

    let response = app.clone().oneshot(get("/api/settings")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["liteMode"], false);

    let response = app
        .clone()
        .oneshot(send_json("POST", "/api/settings", json!({"liteMode": true})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["liteMode"], true);

    let response = app.oneshot(get("/api/settings")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["liteMode"], true);
}

#[tokio::test]
async fn test_cron_cleanup_requires_bearer_token() {
    let (app, _dir) = test_app_with(|config| {
        config.cron_secret = Some("sweep-secret".to_string());
    })
    .await;

    // No token
    let response = app.clone().oneshot(get("/api/cron/cleanup")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong token
    let request = Request::builder()
        .uri("/api/cron/cleanup")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Right token clears auth, then storage configuration is reported
    if std::env::var("R2_ACCOUNT_ID").is_err() {
        let request = Request::builder()
            .uri("/api/cron/cleanup")
            .header(header::AUTHORIZATION, "Bearer sweep-secret")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Storage not configured");
    }
}

#[tokio::test]
async fn test_cron_cleanup_refused_in_production_without_secret() {
    let (app, _dir) = test_app_with(|config| {
        config.cron_secret = None;
        config.environment = "production".to_string();
    })
    .await;

    let response = app.oneshot(get("/api/cron/cleanup")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_api_route_is_404() {
    let (app, _dir) = test_app().await;

    let response = app.oneshot(get("/api/does-not-exist")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
