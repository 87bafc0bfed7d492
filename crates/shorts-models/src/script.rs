//! Generated script models.
//!
//! The generation service produces two distinct segment shapes: time-coded
//! beats from initial generation and structural beats from refinement. Both
//! deserialize into [`ScriptSegment`] so downstream code matches exhaustively
//! instead of probing for fields.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structural role of a refined script beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SegmentRole {
    Hook,
    Body,
    Cta,
}

impl SegmentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hook => "hook",
            Self::Body => "body",
            Self::Cta => "cta",
        }
    }
}

/// One beat of a generated script, in either wire shape.
///
/// Untagged: a payload with `time` is a [`ScriptSegment::Timed`] beat, one
/// with `type` is a [`ScriptSegment::Typed`] beat. Field names match what
/// the generation service actually emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ScriptSegment {
    /// Time-coded beat ("0:03" style marker) from initial generation.
    Timed {
        time: String,
        text: String,
        visual: String,
    },

    /// Structural beat from refinement.
    Typed {
        #[serde(rename = "type")]
        role: SegmentRole,
        text: String,
        visual_prompt: String,
    },
}

impl ScriptSegment {
    /// Spoken text of the beat.
    pub fn text(&self) -> &str {
        match self {
            Self::Timed { text, .. } => text,
            Self::Typed { text, .. } => text,
        }
    }

    /// Visual direction for the beat (scene description or image prompt).
    pub fn visual_direction(&self) -> &str {
        match self {
            Self::Timed { visual, .. } => visual,
            Self::Typed { visual_prompt, .. } => visual_prompt,
        }
    }

    /// Display label: the time marker or the structural role.
    pub fn label(&self) -> &str {
        match self {
            Self::Timed { time, .. } => time,
            Self::Typed { role, .. } => role.as_str(),
        }
    }
}

/// Canonical script-generation result.
///
/// `keywords` and `metadata` are optional on the wire and default to empty
/// so consumers never see an absent field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    /// Predicted virality score (0-100)
    pub virality_score: f32,

    /// Script beats in playback order
    pub script: Vec<ScriptSegment>,

    /// Search keywords for stock footage
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Free-form generation metadata
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Result of refining an existing script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RefinedScript {
    /// Text the caller submitted
    pub original_text: String,

    /// Rewritten text
    pub refined_text: String,

    /// Predicted virality score (0-100)
    pub virality_score: f32,

    /// Structural beats of the rewrite
    pub script: Vec<ScriptSegment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_segment_deserializes() {
        let json = r#"{"time": "0:03", "text": "Hook line", "visual": "Close-up of the product"}"#;
        let seg: ScriptSegment = serde_json::from_str(json).unwrap();
        match seg {
            ScriptSegment::Timed { ref time, ref text, .. } => {
                assert_eq!(time, "0:03");
                assert_eq!(text, "Hook line");
            }
            ScriptSegment::Typed { .. } => panic!("expected timed segment"),
        }
    }

    #[test]
    fn test_typed_segment_deserializes() {
        let json = r#"{"type": "cta", "text": "Follow for more", "visual_prompt": "Bold text overlay"}"#;
        let seg: ScriptSegment = serde_json::from_str(json).unwrap();
        match seg {
            ScriptSegment::Typed { role, ref text, .. } => {
                assert_eq!(role, SegmentRole::Cta);
                assert_eq!(text, "Follow for more");
            }
            ScriptSegment::Timed { .. } => panic!("expected typed segment"),
        }
    }

    #[test]
    fn test_mixed_segment_array() {
        let json = r#"[
            {"time": "0:00", "text": "a", "visual": "b"},
            {"type": "hook", "text": "c", "visual_prompt": "d"}
        ]"#;
        let segs: Vec<ScriptSegment> = serde_json::from_str(json).unwrap();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].label(), "0:00");
        assert_eq!(segs[1].label(), "hook");
        assert_eq!(segs[1].visual_direction(), "d");
    }

    #[test]
    fn test_typed_segment_serializes_wire_names() {
        let seg = ScriptSegment::Typed {
            role: SegmentRole::Body,
            text: "mid".to_string(),
            visual_prompt: "wide shot".to_string(),
        };
        let value = serde_json::to_value(&seg).unwrap();
        assert_eq!(value["type"], "body");
        assert_eq!(value["visual_prompt"], "wide shot");
    }

    #[test]
    fn test_analysis_result_defaults_optional_fields() {
        let json = r#"{
            "virality_score": 78,
            "script": [{"time": "0:00", "text": "a", "visual": "b"}]
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.virality_score, 78.0);
        assert!(result.keywords.is_empty());
        assert!(result.metadata.is_empty());
    }

    #[test]
    fn test_analysis_result_keeps_provided_fields() {
        let json = r#"{
            "virality_score": 91.5,
            "script": [],
            "keywords": ["cats", "asmr"],
            "metadata": {"model": "flash"}
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.keywords, vec!["cats", "asmr"]);
        assert_eq!(result.metadata["model"], "flash");
    }

    #[test]
    fn test_refined_script_deserializes() {
        let json = r#"{
            "original_text": "buy my thing",
            "refined_text": "You need this thing",
            "virality_score": 64,
            "script": [{"type": "hook", "text": "You need this", "visual_prompt": "product reveal"}]
        }"#;
        let refined: RefinedScript = serde_json::from_str(json).unwrap();
        assert_eq!(refined.script.len(), 1);
        assert_eq!(refined.script[0].label(), "hook");
    }
}
