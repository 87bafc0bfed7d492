//! Shared data models for the ShortsAlpha backend.
//!
//! This crate provides Serde-serializable types for:
//! - Project documents and imported assets
//! - Generated scripts (analysis results and segment shapes)
//! - Dialogue scripts for the chat generator
//! - Upload tickets issued by the storage gateway
//! - Subtitle cues

pub mod chat;
pub mod project;
pub mod script;
pub mod subtitle;
pub mod ticket;

// Re-export common types
pub use chat::{ChatMessage, Speaker};
pub use project::{ImportedAsset, ProjectData, ProjectPatch};
pub use script::{AnalysisResult, RefinedScript, ScriptSegment, SegmentRole};
pub use subtitle::SubtitleCue;
pub use ticket::UploadTicket;
