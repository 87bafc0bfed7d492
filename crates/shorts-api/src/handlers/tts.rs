//! Voiceover synthesis handler.
//!
//! The TTS model replies with whatever container it feels like: raw PCM
//! with the rate in the MIME type, MP3, or something else entirely. Raw PCM
//! gets a WAV header so players accept it; anything unrecognized is stored
//! as-is under a `.bin` key.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use shorts_media::wav;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::gemini::DEFAULT_VOICE;
use crate::services::GeminiClient;
use crate::state::AppState;

/// Voiceover request.
#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_speed")]
    pub speed: f64,
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_speed() -> f64 {
    1.0
}

/// Voiceover response.
#[derive(Serialize)]
pub struct TtsResponse {
    pub url: String,
}

/// Synthesize a voiceover, store it, and hand back a playback URL.
pub async fn synthesize(
    State(state): State<AppState>,
    Json(request): Json<TtsRequest>,
) -> ApiResult<Json<TtsResponse>> {
    if request.text.trim().is_empty() {
        return Err(ApiError::bad_request("Text is required"));
    }

    let client = GeminiClient::new()?;
    let start = Instant::now();
    let audio = client
        .synthesize_speech(&request.text, &request.voice, request.speed)
        .await?;
    metrics::record_generation("tts", start.elapsed().as_secs_f64());

    let (data, ext, content_type) = package_audio(audio.data, &audio.mime_type);

    let key = format!("uploads/voiceover-{}.{}", Uuid::new_v4(), ext);
    info!("TTS: storing {} bytes as {} ({})", data.len(), key, content_type);

    let storage = state.storage()?;
    storage.upload_bytes(data, &key, content_type).await?;
    let url = storage.presign_get(&key, state.tickets.read_expiry).await?;

    Ok(Json(TtsResponse { url }))
}

/// Pick a container for the synthesized bytes.
fn package_audio(data: Vec<u8>, mime: &str) -> (Vec<u8>, &'static str, &'static str) {
    if mime.contains("codec=pcm") {
        let rate = wav::parse_rate_from_mime(mime).unwrap_or(wav::DEFAULT_TTS_SAMPLE_RATE);
        let wrapped = wav::wrap_pcm_in_wav(&data, rate, 1, 16);
        (wrapped, "wav", "audio/wav")
    } else if wav::looks_like_mp3(&data) {
        (data, "mp3", "audio/mpeg")
    } else {
        (data, "bin", "application/octet-stream")
    }
}
