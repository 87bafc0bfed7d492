//! Gemini generation service client.
//!
//! One client for every generation call the API makes: script generation,
//! script refinement, fake-chat dialogue, prompt enhancement and speech
//! synthesis. Each operation pins its own model; structured operations ask
//! for `application/json` and parse the first candidate's text into a typed
//! result.

use base64::Engine;
use serde::{Deserialize, Serialize};
use shorts_models::{AnalysisResult, ChatMessage, RefinedScript};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Model for script generation and refinement.
const SCRIPT_MODEL: &str = "gemini-2.0-flash-exp";

/// Model for chat scripts and prompt enhancement.
const PRO_MODEL: &str = "gemini-2.5-pro";

/// Model for speech synthesis.
const TTS_MODEL: &str = "gemini-2.5-pro-preview-tts";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Voice used when the caller doesn't pick one.
pub const DEFAULT_VOICE: &str = "Puck";

/// Client for the Gemini generateContent API.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize, Default)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "responseModalities", skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(rename = "speechConfig", skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Serialize)]
struct SpeechConfig {
    #[serde(rename = "voiceConfig")]
    voice_config: VoiceConfig,
}

#[derive(Serialize)]
struct VoiceConfig {
    #[serde(rename = "prebuiltVoiceConfig")]
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
struct PrebuiltVoiceConfig {
    #[serde(rename = "voiceName")]
    voice_name: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Default)]
struct ResponsePart {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType", default)]
    mime_type: String,
    data: String,
}

/// Synthesized audio payload, still in whatever container the model chose.
pub struct SynthesizedAudio {
    pub data: Vec<u8>,
    pub mime_type: String,
}

// ============================================================================
// Client
// ============================================================================

impl GeminiClient {
    /// Create a client from the environment.
    pub fn new() -> ApiResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| ApiError::config("Missing API Key"))?;
        Ok(Self::with_key(api_key))
    }

    /// Create a client with an explicit key.
    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the client at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Generate a time-coded script for a topic.
    pub async fn generate_script(&self, prompt: &str) -> ApiResult<AnalysisResult> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_generate_prompt(prompt),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                ..Default::default()
            }),
        };

        let text = self.call_for_text(SCRIPT_MODEL, &request).await?;
        parse_json_payload(&text)
    }

    /// Refine raw narration text into structured beats.
    pub async fn refine_script(&self, text: &str) -> ApiResult<RefinedScript> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_refine_prompt(text),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                ..Default::default()
            }),
        };

        let text = self.call_for_text(SCRIPT_MODEL, &request).await?;
        parse_json_payload(&text)
    }

    /// Generate a two-speaker fake-chat conversation.
    pub async fn chat_script(
        &self,
        topic: &str,
        context: Option<&str>,
    ) -> ApiResult<Vec<ChatMessage>> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_chat_prompt(topic, context),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                temperature: Some(0.8),
                ..Default::default()
            }),
        };

        let text = self.call_for_text(PRO_MODEL, &request).await?;
        parse_json_payload(&text)
    }

    /// Expand a short idea into a detailed image/video generation prompt.
    pub async fn enhance_prompt(&self, prompt: &str) -> ApiResult<String> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_enhance_prompt(prompt),
                }],
            }],
            generation_config: None,
        };

        let text = self.call_for_text(PRO_MODEL, &request).await?;
        Ok(text.trim().to_string())
    }

    /// Synthesize a voiceover. Pacing is steered through the prompt since
    /// the API has no speed parameter.
    pub async fn synthesize_speech(
        &self,
        text: &str,
        voice: &str,
        speed: f64,
    ) -> ApiResult<SynthesizedAudio> {
        let voice = if voice.is_empty() { DEFAULT_VOICE } else { voice };

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_tts_prompt(text, speed),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                }),
                ..Default::default()
            }),
        };

        let response = self.call(TTS_MODEL, &request).await?;
        let candidate = response.candidates.into_iter().next();
        if let Some(reason) = candidate.as_ref().and_then(|c| c.finish_reason.as_deref()) {
            debug!("TTS finish reason: {}", reason);
        }

        let inline = candidate
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.inline_data)
            .ok_or_else(|| ApiError::upstream(None, "No audio data"))?;

        let data = base64::engine::general_purpose::STANDARD
            .decode(&inline.data)
            .map_err(|e| ApiError::upstream(None, format!("Invalid audio payload: {}", e)))?;

        Ok(SynthesizedAudio {
            data,
            mime_type: inline.mime_type,
        })
    }

    /// Call the API and pull out the first candidate's text.
    async fn call_for_text(&self, model: &str, request: &GeminiRequest) -> ApiResult<String> {
        let response = self.call(model, request).await?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| ApiError::upstream(None, "No text in generation response"))
    }

    async fn call(&self, model: &str, request: &GeminiRequest) -> ApiResult<GeminiResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::upstream(None, format!("Generation request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API error {}: {}", status, body);
            return Err(ApiError::upstream(
                Some(status.as_u16()),
                format!("Gemini API returned {}: {}", status.as_u16(), body),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::upstream(None, format!("Invalid generation response: {}", e)))
    }
}

/// Parse a JSON payload out of model text, tolerating markdown fences.
fn parse_json_payload<T: serde::de::DeserializeOwned>(text: &str) -> ApiResult<T> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(cleaned).map_err(|e| {
        warn!("Unparseable generation payload: {}", cleaned);
        ApiError::upstream(None, format!("Invalid generation payload: {}", e))
    })
}

/// Strip markdown code fences the model sometimes wraps JSON in.
fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if text.starts_with("```json") {
        text = &text[7..];
    } else if text.starts_with("```") {
        text = &text[3..];
    }
    if text.ends_with("```") {
        text = &text[..text.len() - 3];
    }
    text.trim()
}

// ============================================================================
// Prompt Templates
// ============================================================================

fn build_generate_prompt(topic: &str) -> String {
    format!(
        r#"You are a viral short video script writer.
Generate a JSON response with a 'virality_score' (number 0-100) and a 'script' array.
Each item in 'script' should have:
- 'time': string (e.g., "00:00 - 00:05")
- 'text': string (The voiceover text)
- 'visual': string (Description of background visual)

The story should be engaging, fast-paced, and suitable for a 30-60 second vertical video.
Topic: {}"#,
        topic
    )
}

fn build_refine_prompt(text: &str) -> String {
    format!(
        r#"You are a professional script editor and viral video expert.
Your task is to take the user's raw text and:
1. Fix any grammar or spelling mistakes.
2. Improve the flow and pacing for a short vertical video (30-60s).
3. Break it down into logical segments (Hook, Body, Conclusion).

Generate a JSON response with:
- 'original_text': string (the input text)
- 'refined_text': string (the full polished version)
- 'virality_score': number (0-100)
- 'script': array of objects, where each object has:
    - 'text': string (The spoken voiceover segment)
    - 'type': 'hook' | 'body' | 'cta'
    - 'visual_prompt': string (Brief suggestion for a background visual)

Input Text:
"{}""#,
        text
    )
}

fn build_chat_prompt(topic: &str, context: Option<&str>) -> String {
    let system = r#"You are an expert scriptwriter for viral social media videos (Shorts/TikTok).
Your goal is to write a "Fake Chat" conversation that is engaging, funny, or dramatic.

Rules:
1. Two speakers: "A" (Sender/Right) and "B" (Receiver/Left).
2. Keep messages short and punchy (text message style).
3. Use slang, abbreviations, and emojis where appropriate for the context.
4. Total length: 10-15 messages.
5. Output strictly valid JSON array of objects.

Output Format:
[
    { "speaker": "A", "text": "..." },
    { "speaker": "B", "text": "..." }
]"#;

    format!(
        "{}\n\nTopic: {}\nContext: {}\n\nGenerate the JSON script now.",
        system,
        topic,
        context.unwrap_or("Make it viral and catchy.")
    )
}

fn build_enhance_prompt(prompt: &str) -> String {
    format!(
        r#"You are an expert AI Video Prompt Engineer and Cinematographer.
Your goal is to take a simple user idea and transform it into a "Perfect Prompt" for Stable Video Diffusion (SVD/SDXL).

The user wants the output to be "flawless, detailed, and cinematic".

Guidelines:
- Focus on visual details: Lighting (volumetric, cinematic, golden hour), Texture (8k, hyperrealistic), Camera Movement (slow pan, dolly zoom), and Atmosphere.
- Style: Photorealistic, 8k, Unreal Engine 5, Octane Render.
- Keep the prompt under 77 tokens if possible, or dense and comma-separated.
- Output ONLY the raw prompt text, no "Here is the prompt:" preambles.

Input: "{}"

Output:"#,
        prompt
    )
}

fn build_tts_prompt(text: &str, speed: f64) -> String {
    let pacing = if speed >= 1.5 {
        "Speak very fast and urgently, like a viral short video narrator. "
    } else if speed > 1.0 {
        "Speak quickly and energetically. "
    } else if speed < 0.8 {
        "Speak slowly, deliberately, and clearly. "
    } else if speed < 1.0 {
        "Speak slightly slower and more composed. "
    } else {
        ""
    };

    if pacing.is_empty() {
        text.to_string()
    } else {
        format!("[Director's Note: {}] {}", pacing, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_response(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] }
            }]
        })
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1,2]\n```"), "[1,2]");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_tts_prompt_pacing_thresholds() {
        assert!(build_tts_prompt("hi", 1.5).contains("very fast and urgently"));
        assert!(build_tts_prompt("hi", 1.2).contains("quickly and energetically"));
        assert!(build_tts_prompt("hi", 0.7).contains("slowly, deliberately"));
        assert!(build_tts_prompt("hi", 0.9).contains("slightly slower"));
        assert_eq!(build_tts_prompt("hi", 1.0), "hi");
    }

    #[tokio::test]
    async fn test_generate_script_parses_analysis() {
        let server = MockServer::start().await;

        let payload = json!({
            "virality_score": 88,
            "script": [
                { "time": "00:00 - 00:05", "text": "Hook line", "visual": "City at night" }
            ],
            "keywords": ["city"]
        });

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
            .and(body_partial_json(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&payload.to_string())))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::with_key("test-key").with_base_url(server.uri());
        let result = client.generate_script("city facts").await.unwrap();

        assert_eq!(result.virality_score, 88.0);
        assert_eq!(result.script.len(), 1);
        assert_eq!(result.script[0].text(), "Hook line");
        assert_eq!(result.keywords, vec!["city"]);
    }

    #[tokio::test]
    async fn test_chat_script_strips_fences() {
        let server = MockServer::start().await;

        let fenced = "```json\n[{\"speaker\":\"A\",\"text\":\"yo\"},{\"speaker\":\"B\",\"text\":\"what\"}]\n```";

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
            .and(body_partial_json(json!({
                "generationConfig": { "temperature": 0.8 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response(fenced)))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::with_key("test-key").with_base_url(server.uri());
        let messages = client.chat_script("breakup drama", None).await.unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].speaker, shorts_models::Speaker::A);
        assert_eq!(messages[1].text, "what");
    }

    #[tokio::test]
    async fn test_enhance_prompt_returns_trimmed_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(text_response("  cinematic shot, 8k, golden hour  \n")),
            )
            .mount(&server)
            .await;

        let client = GeminiClient::with_key("test-key").with_base_url(server.uri());
        let enhanced = client.enhance_prompt("a cat").await.unwrap();

        assert_eq!(enhanced, "cinematic shot, 8k, golden hour");
    }

    #[tokio::test]
    async fn test_upstream_error_carries_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client = GeminiClient::with_key("test-key").with_base_url(server.uri());
        let err = client.generate_script("anything").await.unwrap_err();

        match err {
            ApiError::Upstream { status, message } => {
                assert_eq!(status, Some(429));
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_synthesize_speech_decodes_inline_audio() {
        use base64::Engine;

        let server = MockServer::start().await;

        let pcm = vec![0u8, 1, 2, 3, 4, 5];
        let encoded = base64::engine::general_purpose::STANDARD.encode(&pcm);

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-pro-preview-tts:generateContent"))
            .and(body_partial_json(json!({
                "generationConfig": {
                    "responseModalities": ["AUDIO"],
                    "speechConfig": {
                        "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Kore" } }
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "parts": [{
                            "inlineData": {
                                "mimeType": "audio/L16;codec=pcm;rate=24000",
                                "data": encoded
                            }
                        }]
                    },
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::with_key("test-key").with_base_url(server.uri());
        let audio = client.synthesize_speech("hello", "Kore", 1.0).await.unwrap();

        assert_eq!(audio.data, pcm);
        assert_eq!(audio.mime_type, "audio/L16;codec=pcm;rate=24000");
    }

    #[tokio::test]
    async fn test_empty_candidates_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = GeminiClient::with_key("test-key").with_base_url(server.uri());
        let err = client.enhance_prompt("a dog").await.unwrap_err();

        assert!(matches!(err, ApiError::Upstream { status: None, .. }));
    }
}
