//! Subtitle cue model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One subtitle cue: start offset and duration in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubtitleCue {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}
