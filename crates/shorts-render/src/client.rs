//! HTTP client for the delegated render backends.
//!
//! Three endpoints are covered: automatic highlight processing, timeline
//! renders, and subtitle generation. Submissions are fire-and-forget; the
//! backend acknowledges receipt and writes its output to storage, and
//! completion is detected by probing the output location (see
//! [`crate::poll`]). The timeline and subtitle endpoints fall back to mock
//! responses when their URLs are not configured, so the rest of the
//! pipeline can be exercised without a live backend.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use shorts_models::SubtitleCue;

use crate::error::{RenderError, RenderResult};
use crate::poll::PollStatus;

/// Default timeout for process submissions.
const PROCESS_TIMEOUT_SECS: u64 = 15;
/// Default timeout for timeline render submissions.
const RENDER_TIMEOUT_SECS: u64 = 30;
/// Default timeout for subtitle jobs, which transcribe before replying.
const SUBTITLE_TIMEOUT_SECS: u64 = 120;

/// Storage credentials forwarded to the backends so they can read source
/// objects and write outputs directly.
#[derive(Debug, Clone, Default)]
pub struct BackendCredentials {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
}

impl BackendCredentials {
    /// Read credentials from `R2_*` environment variables. Missing
    /// variables become empty strings; the backends require the fields
    /// to be present and reject empty values themselves.
    pub fn from_env() -> Self {
        Self {
            account_id: env_or_empty("R2_ACCOUNT_ID"),
            access_key_id: env_or_empty("R2_ACCESS_KEY_ID"),
            secret_access_key: env_or_empty("R2_SECRET_ACCESS_KEY"),
            bucket_name: env_or_empty("R2_BUCKET_NAME"),
        }
    }
}

fn env_or_empty(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

/// Configuration for the render client.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Endpoint for automatic highlight processing (`MODAL_API_URL`).
    pub process_url: Option<String>,
    /// Endpoint for timeline renders (`MODAL_RENDER_URL`).
    pub render_url: Option<String>,
    /// Endpoint for subtitle generation (`MODAL_SUBTITLES_URL`).
    pub subtitles_url: Option<String>,
    /// Public base URL of the storage bucket, used to build source and
    /// result URLs (`R2_PUBLIC_URL`).
    pub public_base_url: Option<String>,
    /// Generation service API key forwarded to backends that need it.
    pub api_key: Option<String>,
    /// Storage credentials injected into submission payloads.
    pub credentials: BackendCredentials,
    /// Timeout for process submissions.
    pub process_timeout: Duration,
    /// Timeout for timeline render submissions.
    pub render_timeout: Duration,
    /// Timeout for subtitle jobs.
    pub subtitle_timeout: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            process_url: None,
            render_url: None,
            subtitles_url: None,
            public_base_url: None,
            api_key: None,
            credentials: BackendCredentials::default(),
            process_timeout: Duration::from_secs(PROCESS_TIMEOUT_SECS),
            render_timeout: Duration::from_secs(RENDER_TIMEOUT_SECS),
            subtitle_timeout: Duration::from_secs(SUBTITLE_TIMEOUT_SECS),
        }
    }
}

impl RenderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            process_url: std::env::var("MODAL_API_URL").ok(),
            render_url: std::env::var("MODAL_RENDER_URL").ok(),
            subtitles_url: std::env::var("MODAL_SUBTITLES_URL").ok(),
            public_base_url: std::env::var("R2_PUBLIC_URL").ok(),
            api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("GOOGLE_API_KEY"))
                .ok(),
            credentials: BackendCredentials::from_env(),
            ..Default::default()
        }
    }
}

/// Acknowledgment of a process submission.
#[derive(Debug, Clone)]
pub struct ProcessSubmission {
    /// Key the backend will write the processed output to.
    pub output_key: String,
    /// Raw acknowledgment payload from the backend.
    pub ack: Value,
}

/// Result of probing an output location.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputProbe {
    /// Output exists. A JSON status file's parsed body is carried through.
    Ready { body: Option<Value> },
    /// Output not present yet.
    Pending,
    /// Transport failure reaching the location.
    Error { message: String },
}

/// Derive the output key for an automatically processed source.
///
/// Sources live under `uploads/`; the backend writes the processed result
/// to the matching key under `processed/`. Keys outside `uploads/` pass
/// through unchanged.
pub fn derive_output_key(source_key: &str) -> String {
    source_key.replacen("uploads/", "processed/", 1)
}

/// Client for the delegated render backends.
pub struct RenderClient {
    http: Client,
    config: RenderConfig,
}

impl RenderClient {
    /// Create a new render client.
    pub fn new(config: RenderConfig) -> RenderResult<Self> {
        let http = Client::builder().build().map_err(RenderError::Network)?;
        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> RenderResult<Self> {
        Self::new(RenderConfig::from_env())
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Submit an uploaded source for automatic highlight processing.
    ///
    /// The backend pulls the source from its public URL, runs the full
    /// pipeline, and writes the result under the derived output key. The
    /// returned acknowledgment carries whatever the backend replied with;
    /// completion is observed later by polling.
    pub async fn submit_process(&self, source_key: &str) -> RenderResult<ProcessSubmission> {
        let process_url = self
            .config
            .process_url
            .as_deref()
            .ok_or_else(|| RenderError::not_configured("MODAL_API_URL is not set"))?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| RenderError::not_configured("generation service API key is not set"))?;
        let public_base = self
            .config
            .public_base_url
            .as_deref()
            .ok_or_else(|| RenderError::not_configured("R2_PUBLIC_URL is not set"))?;

        let output_key = derive_output_key(source_key);
        let creds = &self.config.credentials;
        let payload = json!({
            "video_url": format!("{}/{}", public_base, source_key),
            "output_key": output_key,
            "api_key": api_key,
            "r2_account_id": creds.account_id,
            "r2_access_key_id": creds.access_key_id,
            "r2_secret_access_key": creds.secret_access_key,
            "r2_bucket_name": creds.bucket_name,
        });

        debug!("Submitting {} for processing to {}", source_key, process_url);

        let ack = self
            .post_json(process_url, &payload, self.config.process_timeout)
            .await?;

        Ok(ProcessSubmission { output_key, ack })
    }

    /// Submit a timeline render.
    ///
    /// The payload is the caller's timeline document (tracks, output key,
    /// render options) with storage credentials injected server side:
    /// configured values win over caller-supplied ones, and missing fields
    /// are sent as empty strings because the backend requires them to be
    /// present. Returns a mock acknowledgment when no render backend is
    /// configured.
    pub async fn submit_timeline(&self, mut payload: Map<String, Value>) -> RenderResult<Value> {
        let Some(render_url) = self.config.render_url.as_deref() else {
            warn!("MODAL_RENDER_URL not set, returning mock render acknowledgment");
            return Ok(json!({
                "status": "mock_success",
                "message": "Render started (Mock). Configure MODAL_RENDER_URL to use real backend.",
                "call_id": format!("mock-call-id-{}", chrono::Utc::now().timestamp_millis()),
            }));
        };

        let output_key = payload
            .get("output_key")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let creds = &self.config.credentials;
        inject_credential(&mut payload, "r2_account_id", &creds.account_id);
        inject_credential(&mut payload, "r2_access_key_id", &creds.access_key_id);
        inject_credential(&mut payload, "r2_secret_access_key", &creds.secret_access_key);
        inject_credential(&mut payload, "r2_bucket_name", &creds.bucket_name);

        debug!("Submitting timeline render to {}", render_url);

        let mut ack = self
            .post_json(
                render_url,
                &Value::Object(payload),
                self.config.render_timeout,
            )
            .await?;

        // Hand the expected result location back so the caller can poll it.
        if let (Some(base), Some(key), Value::Object(map)) =
            (self.config.public_base_url.as_deref(), output_key, &mut ack)
        {
            map.insert(
                "result_url".to_string(),
                Value::String(format!("{}/{}", base, key)),
            );
        }

        Ok(ack)
    }

    /// Submit a subtitle generation job.
    ///
    /// Credentials and the generation service API key are overwritten with
    /// configured values (empty strings when unset). Returns a fixed pair
    /// of mock cues when no subtitle backend is configured.
    pub async fn submit_subtitles(&self, mut payload: Map<String, Value>) -> RenderResult<Value> {
        let Some(subtitles_url) = self.config.subtitles_url.as_deref() else {
            warn!("MODAL_SUBTITLES_URL not set, returning mock subtitles");
            let cues = serde_json::to_value(mock_subtitle_cues())?;
            return Ok(json!({
                "status": "mock_success",
                "subtitles": cues,
            }));
        };

        let creds = &self.config.credentials;
        let api_key = self.config.api_key.clone().unwrap_or_default();
        payload.insert("api_key".to_string(), Value::String(api_key));
        payload.insert(
            "r2_account_id".to_string(),
            Value::String(creds.account_id.clone()),
        );
        payload.insert(
            "r2_access_key_id".to_string(),
            Value::String(creds.access_key_id.clone()),
        );
        payload.insert(
            "r2_secret_access_key".to_string(),
            Value::String(creds.secret_access_key.clone()),
        );
        payload.insert(
            "r2_bucket_name".to_string(),
            Value::String(creds.bucket_name.clone()),
        );

        debug!("Submitting subtitle job to {}", subtitles_url);

        self.post_json(
            subtitles_url,
            &Value::Object(payload),
            self.config.subtitle_timeout,
        )
        .await
    }

    /// Probe an output location once.
    ///
    /// Issues an uncached fetch of the URL: a success means the output is
    /// ready, any other HTTP status means the backend has not written it
    /// yet, and a transport failure is reported as an error. When the URL
    /// names a JSON status file, its parsed body rides along on the ready
    /// result.
    pub async fn probe_output(&self, url: &str) -> OutputProbe {
        let request = self.http.get(url).header("Cache-Control", "no-cache");

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                if url.ends_with(".json") {
                    match response.json().await {
                        Ok(body) => OutputProbe::Ready { body: Some(body) },
                        Err(e) => OutputProbe::Error {
                            message: format!("invalid status file: {}", e),
                        },
                    }
                } else {
                    OutputProbe::Ready { body: None }
                }
            }
            Ok(response) => {
                debug!("Output not ready at {}: {}", url, response.status());
                OutputProbe::Pending
            }
            Err(e) => OutputProbe::Error {
                message: e.to_string(),
            },
        }
    }

    /// Single poll of an output URL, reduced to a [`PollStatus`].
    pub async fn poll_once(&self, url: &str) -> PollStatus {
        match self.probe_output(url).await {
            OutputProbe::Ready { .. } => PollStatus::Ready,
            OutputProbe::Pending => PollStatus::Pending,
            OutputProbe::Error { message } => PollStatus::Error(message),
        }
    }

    async fn post_json(
        &self,
        url: &str,
        payload: &Value,
        timeout: Duration,
    ) -> RenderResult<Value> {
        let response = self
            .http
            .post(url)
            .timeout(timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::upstream(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| RenderError::InvalidResponse(e.to_string()))
    }
}

/// Insert a credential field: the configured value wins, a caller-supplied
/// one is kept as fallback, and the field is always present (empty string
/// when neither side has it).
fn inject_credential(payload: &mut Map<String, Value>, field: &str, configured: &str) {
    let value = if !configured.is_empty() {
        configured.to_string()
    } else {
        payload
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    payload.insert(field.to_string(), Value::String(value));
}

fn mock_subtitle_cues() -> Vec<SubtitleCue> {
    vec![
        SubtitleCue {
            start: 0.0,
            duration: 2.0,
            text: "Mock Subtitle 1".to_string(),
        },
        SubtitleCue {
            start: 2.5,
            duration: 2.0,
            text: "Mock Subtitle 2".to_string(),
        },
    ]
}
