//! Script generation handlers.

use std::time::Instant;

use axum::Json;
use serde::{Deserialize, Serialize};
use shorts_models::{AnalysisResult, ChatMessage, RefinedScript};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::GeminiClient;

/// Script generation request.
#[derive(Debug, Deserialize)]
pub struct GenerateScriptRequest {
    #[serde(default)]
    pub prompt: String,
}

/// Generate a time-coded script for a topic.
pub async fn generate_script(
    Json(request): Json<GenerateScriptRequest>,
) -> ApiResult<Json<AnalysisResult>> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("Prompt is required"));
    }

    let client = GeminiClient::new()?;
    let start = Instant::now();
    let analysis = client.generate_script(&request.prompt).await?;
    metrics::record_generation("generate_script", start.elapsed().as_secs_f64());

    info!(
        "Generated script with {} beats, virality {}",
        analysis.script.len(),
        analysis.virality_score
    );

    Ok(Json(analysis))
}

/// Script refinement request.
#[derive(Debug, Deserialize)]
pub struct RefineScriptRequest {
    #[serde(default)]
    pub text: String,
}

/// Refine raw narration into structured beats.
pub async fn refine_script(
    Json(request): Json<RefineScriptRequest>,
) -> ApiResult<Json<RefinedScript>> {
    if request.text.trim().is_empty() {
        return Err(ApiError::bad_request("Text is required"));
    }

    let client = GeminiClient::new()?;
    let start = Instant::now();
    let refined = client.refine_script(&request.text).await?;
    metrics::record_generation("refine_script", start.elapsed().as_secs_f64());

    Ok(Json(refined))
}

/// Chat script request.
#[derive(Debug, Deserialize)]
pub struct ChatScriptRequest {
    #[serde(default)]
    pub topic: String,
    pub context: Option<String>,
}

/// Chat script response.
#[derive(Serialize)]
pub struct ChatScriptResponse {
    pub messages: Vec<ChatMessage>,
}

/// Generate a two-speaker fake-chat conversation.
pub async fn chat_script(
    Json(request): Json<ChatScriptRequest>,
) -> ApiResult<Json<ChatScriptResponse>> {
    if request.topic.trim().is_empty() {
        return Err(ApiError::bad_request("Topic is required"));
    }

    let client = GeminiClient::new()?;
    let start = Instant::now();
    let messages = client
        .chat_script(&request.topic, request.context.as_deref())
        .await?;
    metrics::record_generation("chat_script", start.elapsed().as_secs_f64());

    info!("Generated chat script with {} messages", messages.len());

    Ok(Json(ChatScriptResponse { messages }))
}

/// Prompt enhancement request.
#[derive(Debug, Deserialize)]
pub struct EnhancePromptRequest {
    #[serde(default)]
    pub prompt: String,
}

/// Prompt enhancement response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancePromptResponse {
    pub enhanced_prompt: String,
}

/// Expand a short idea into a detailed generation prompt.
pub async fn enhance_prompt(
    Json(request): Json<EnhancePromptRequest>,
) -> ApiResult<Json<EnhancePromptResponse>> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("Prompt is required"));
    }

    let client = GeminiClient::new()?;
    let start = Instant::now();
    let enhanced_prompt = client.enhance_prompt(&request.prompt).await?;
    metrics::record_generation("enhance_prompt", start.elapsed().as_secs_f64());

    Ok(Json(EnhancePromptResponse { enhanced_prompt }))
}
