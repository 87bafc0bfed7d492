//! Two-speaker dialogue models for the chat-script generator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which side of the conversation a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Speaker {
    A,
    B,
}

/// One message of a generated fake-chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
}
