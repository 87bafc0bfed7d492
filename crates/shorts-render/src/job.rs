//! Render job tracking.
//!
//! A [`RenderJob`] is the transient record of one delegated render. It is
//! held in memory by whichever task drives the poll loop and is not
//! persisted, so a restart mid-render loses the handle and the caller must
//! re-check the output location manually.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a render job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderJobId(pub String);

impl RenderJobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RenderJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RenderJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a delegated render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderJobState {
    /// Submitted to the backend, no probe issued yet
    #[default]
    Submitted,
    /// Probing the output location on an interval
    Polling,
    /// Output object is fetchable
    Ready,
    /// Submission or probe failed
    Error,
    /// Attempt budget exhausted without the output appearing
    TimedOut,
}

impl RenderJobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderJobState::Submitted => "submitted",
            RenderJobState::Polling => "polling",
            RenderJobState::Ready => "ready",
            RenderJobState::Error => "error",
            RenderJobState::TimedOut => "timed_out",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RenderJobState::Ready | RenderJobState::Error | RenderJobState::TimedOut
        )
    }
}

/// One delegated render, from submission to a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    /// Unique job ID
    pub id: RenderJobId,

    /// Storage key of the source object
    pub source_key: String,

    /// Storage key the backend writes the output to
    pub output_key: String,

    /// URL probed for output existence
    pub output_url: String,

    /// Current state
    #[serde(default)]
    pub state: RenderJobState,

    /// Number of probes issued so far
    #[serde(default)]
    pub attempts: u32,

    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RenderJob {
    /// Create a new job in the `submitted` state.
    pub fn new(
        source_key: impl Into<String>,
        output_key: impl Into<String>,
        output_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: RenderJobId::new(),
            source_key: source_key.into(),
            output_key: output_key.into(),
            output_url: output_url.into(),
            state: RenderJobState::Submitted,
            attempts: 0,
            submitted_at: now,
            updated_at: now,
            error_message: None,
        }
    }

    /// Enter the polling state.
    pub fn begin_polling(mut self) -> Self {
        self.state = RenderJobState::Polling;
        self.updated_at = Utc::now();
        self
    }

    /// Count one issued probe.
    pub fn record_attempt(mut self) -> Self {
        self.attempts += 1;
        self.updated_at = Utc::now();
        self
    }

    /// Mark the output as fetchable.
    pub fn complete(mut self) -> Self {
        self.state = RenderJobState::Ready;
        self.updated_at = Utc::now();
        self
    }

    /// Mark the job as failed.
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.state = RenderJobState::Error;
        self.error_message = Some(message.into());
        self.updated_at = Utc::now();
        self
    }

    /// Mark the job as timed out after exhausting its attempt budget.
    pub fn time_out(mut self) -> Self {
        self.state = RenderJobState::TimedOut;
        self.updated_at = Utc::now();
        self
    }
}
